use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Select,
    Set,
};

use crate::crud::{RequestContext, Resource};
use crate::entity::{athlete_discipline, discipline};
use crate::error::AppError;
use crate::models::discipline::{DisciplineFilter, DisciplinePayload};

pub struct Disciplines;

#[async_trait]
impl Resource for Disciplines {
    type Entity = discipline::Entity;
    type Model = discipline::Model;
    type ActiveModel = discipline::ActiveModel;
    type Column = discipline::Column;
    type Payload = DisciplinePayload;
    type Filter = DisciplineFilter;
    type Record = discipline::Model;
    type Response = discipline::Model;

    fn id_column() -> discipline::Column {
        discipline::Column::Id
    }

    fn list_query(
        mut select: Select<discipline::Entity>,
        filter: &DisciplineFilter,
        ctx: &RequestContext,
    ) -> Result<Select<discipline::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(discipline::Column::Id.is_in(ids.clone()));
        }
        if let Some(name) = &filter.name {
            select = select.filter(discipline::Column::Name.eq(name.as_str()));
        }
        if let Some(kind) = &filter.kind {
            select = select.filter(discipline::Column::Kind.eq(kind.as_str()));
        }
        Ok(Self::scope(select, ctx))
    }

    fn to_active_model(payload: &DisciplinePayload, _ctx: &RequestContext) -> discipline::ActiveModel {
        discipline::ActiveModel {
            name: Set(payload.name.clone()),
            kind: Set(payload.kind.clone()),
            ..Default::default()
        }
    }

    async fn before_delete(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        athlete_discipline::Entity::delete_many()
            .filter(athlete_discipline::Column::DisciplineId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn load(
        _db: &DatabaseConnection,
        models: Vec<discipline::Model>,
    ) -> Result<Vec<discipline::Model>, DbErr> {
        Ok(models)
    }

    fn shape(record: discipline::Model) -> discipline::Model {
        record
    }
}
