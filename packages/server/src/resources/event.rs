use async_trait::async_trait;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Select,
    Set,
};

use crate::crud::{RequestContext, Resource};
use crate::entity::{answer, event, question};
use crate::error::AppError;
use crate::models::event::{EventFilter, EventPayload};

pub struct Events;

#[async_trait]
impl Resource for Events {
    type Entity = event::Entity;
    type Model = event::Model;
    type ActiveModel = event::ActiveModel;
    type Column = event::Column;
    type Payload = EventPayload;
    type Filter = EventFilter;
    type Record = event::Model;
    type Response = event::Model;

    fn id_column() -> event::Column {
        event::Column::Id
    }

    fn list_query(
        mut select: Select<event::Entity>,
        filter: &EventFilter,
        ctx: &RequestContext,
    ) -> Result<Select<event::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(event::Column::Id.is_in(ids.clone()));
        }
        match filter.active {
            Some(true) => select = select.filter(event::Column::Deadline.gt(ctx.now)),
            Some(false) => select = select.filter(event::Column::Deadline.lte(ctx.now)),
            None => {}
        }
        Ok(Self::scope(select, ctx))
    }

    fn to_active_model(payload: &EventPayload, _ctx: &RequestContext) -> event::ActiveModel {
        event::ActiveModel {
            name: Set(payload.name.clone()),
            description: Set(payload.description.clone()),
            deadline: Set(payload.deadline),
            ..Default::default()
        }
    }

    async fn before_delete(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        answer::Entity::delete_many()
            .filter(
                answer::Column::QuestionId.in_subquery(
                    SeaQuery::select()
                        .column(question::Column::Id)
                        .from(question::Entity)
                        .and_where(question::Column::EventId.eq(id))
                        .to_owned(),
                ),
            )
            .exec(txn)
            .await?;
        question::Entity::delete_many()
            .filter(question::Column::EventId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn load(
        _db: &DatabaseConnection,
        models: Vec<event::Model>,
    ) -> Result<Vec<event::Model>, DbErr> {
        Ok(models)
    }

    fn shape(record: event::Model) -> event::Model {
        record
    }
}
