use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::ExprTrait;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, Select, Set,
};

use super::existing_ids;
use crate::crud::{Action, RequestContext, Resource};
use crate::entity::{athlete, athlete_discipline, discipline};
use crate::error::{AppError, FieldError};
use crate::models::athlete::{AthleteFilter, AthletePayload, AthleteResponse};
use crate::models::shared::escape_like;

pub struct Athletes;

/// Replace the disciplines of `athlete_id` with `discipline_ids`.
async fn assign_disciplines<C: ConnectionTrait>(
    conn: &C,
    athlete_id: i32,
    discipline_ids: &[i32],
) -> Result<(), DbErr> {
    athlete_discipline::Entity::delete_many()
        .filter(athlete_discipline::Column::AthleteId.eq(athlete_id))
        .exec(conn)
        .await?;

    let mut ids = discipline_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    athlete_discipline::Entity::insert_many(ids.into_iter().map(|discipline_id| {
        athlete_discipline::ActiveModel {
            athlete_id: Set(athlete_id),
            discipline_id: Set(discipline_id),
        }
    }))
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl Resource for Athletes {
    type Entity = athlete::Entity;
    type Model = athlete::Model;
    type ActiveModel = athlete::ActiveModel;
    type Column = athlete::Column;
    type Payload = AthletePayload;
    type Filter = AthleteFilter;
    type Record = (athlete::Model, Vec<String>);
    type Response = AthleteResponse;

    fn id_column() -> athlete::Column {
        athlete::Column::Id
    }

    fn list_query(
        mut select: Select<athlete::Entity>,
        filter: &AthleteFilter,
        ctx: &RequestContext,
    ) -> Result<Select<athlete::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(athlete::Column::Id.is_in(ids.clone()));
        }

        // Every term must match the first or the last name.
        if let Some(search) = &filter.search {
            for term in search.split_whitespace() {
                let pattern = format!("%{}%", escape_like(term).to_lowercase());
                select = select.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(athlete::Column::FirstName)))
                                .like(LikeExpr::new(pattern.clone()).escape('\\')),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(athlete::Column::LastName)))
                                .like(LikeExpr::new(pattern).escape('\\')),
                        ),
                );
            }
        }

        if let Some(discipline_ids) = &filter.discipline_ids {
            select = select.filter(
                athlete::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(athlete_discipline::Column::AthleteId)
                        .from(athlete_discipline::Entity)
                        .and_where(
                            athlete_discipline::Column::DisciplineId.is_in(discipline_ids.clone()),
                        )
                        .to_owned(),
                ),
            );
        }
        if let Some(country) = &filter.country {
            select = select.filter(athlete::Column::Country.eq(country.as_str()));
        }
        if let Some(gender) = &filter.gender {
            select = select.filter(athlete::Column::Gender.eq(gender.as_str()));
        }

        Ok(Self::scope(select, ctx))
    }

    fn to_active_model(payload: &AthletePayload, _ctx: &RequestContext) -> athlete::ActiveModel {
        athlete::ActiveModel {
            first_name: Set(payload.first_name.clone()),
            last_name: Set(payload.last_name.clone()),
            birthday: Set(payload.birthday),
            country: Set(payload.country.clone()),
            gender: Set(payload.gender.clone()),
            ..Default::default()
        }
    }

    async fn validate(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        payload: &AthletePayload,
        _action: Action,
    ) -> Result<(), AppError> {
        let found = existing_ids::<discipline::Entity, _, _>(
            txn,
            discipline::Column::Id,
            payload.discipline_ids.clone(),
        )
        .await?;

        let missing: Vec<FieldError> = payload
            .discipline_ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| {
                FieldError::new("discipline_ids", "id_of", format!("discipline {id} does not exist"))
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(missing))
        }
    }

    async fn after_create(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        payload: &AthletePayload,
        created: &athlete::Model,
    ) -> Result<(), AppError> {
        assign_disciplines(txn, created.id, &payload.discipline_ids).await?;
        Ok(())
    }

    async fn after_update(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
        payload: &AthletePayload,
    ) -> Result<(), AppError> {
        assign_disciplines(txn, id, &payload.discipline_ids).await?;
        Ok(())
    }

    async fn before_delete(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        athlete_discipline::Entity::delete_many()
            .filter(athlete_discipline::Column::AthleteId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn load(
        db: &DatabaseConnection,
        models: Vec<athlete::Model>,
    ) -> Result<Vec<(athlete::Model, Vec<String>)>, DbErr> {
        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let links = athlete_discipline::Entity::find()
            .filter(athlete_discipline::Column::AthleteId.is_in(ids))
            .find_also_related(discipline::Entity)
            .all(db)
            .await?;

        let mut names: HashMap<i32, Vec<String>> = HashMap::new();
        for (link, discipline) in links {
            if let Some(discipline) = discipline {
                names.entry(link.athlete_id).or_default().push(discipline.name);
            }
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let mut disciplines = names.remove(&model.id).unwrap_or_default();
                disciplines.sort();
                (model, disciplines)
            })
            .collect())
    }

    fn shape((athlete, disciplines): (athlete::Model, Vec<String>)) -> AthleteResponse {
        AthleteResponse::new(athlete, disciplines)
    }
}
