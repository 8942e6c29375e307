use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, DeleteMany,
    EntityTrait, QueryFilter, QuerySelect, Select, Set, SqlErr, UpdateMany,
};

use super::{EVENT_CLOSED, EVENT_CLOSED_MSG, check_content, question_with_event};
use crate::crud::{Action, RequestContext, Resource};
use crate::entity::answer;
use crate::error::AppError;
use crate::models::answer::{AnswerFilter, AnswerPayload};

const ALREADY_ANSWERED: &str = "already answered by current user";
const POINTS_GRANTED: &str = "points already granted";

/// Answers. On `/users/me/answers` every query is limited to the caller's rows.
pub struct Answers;

impl Answers {
    /// The caller's own answer, rejected once it has been graded or its event closed.
    ///
    /// The row stays locked until the write commits, so a concurrent grading
    /// run either finishes first and is seen here or waits for the write.
    async fn editable(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        id: i32,
    ) -> Result<answer::Model, AppError> {
        let existing = Self::get_query(answer::Entity::find(), id, ctx)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.points_granted_at.is_some() {
            return Err(AppError::field("question_id", "points_granted", POINTS_GRANTED));
        }

        let (_, event) = question_with_event(txn, existing.question_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if event.is_closed(ctx.now) {
            return Err(AppError::field("question_id", EVENT_CLOSED, EVENT_CLOSED_MSG));
        }

        Ok(existing)
    }
}

#[async_trait]
impl Resource for Answers {
    type Entity = answer::Entity;
    type Model = answer::Model;
    type ActiveModel = answer::ActiveModel;
    type Column = answer::Column;
    type Payload = AnswerPayload;
    type Filter = AnswerFilter;
    type Record = answer::Model;
    type Response = answer::Model;

    fn id_column() -> answer::Column {
        answer::Column::Id
    }

    fn scope<Q: QueryFilter>(query: Q, ctx: &RequestContext) -> Q {
        if ctx.own_records_only {
            query.filter(answer::Column::UserId.eq(ctx.user.id))
        } else {
            query
        }
    }

    fn list_query(
        mut select: Select<answer::Entity>,
        filter: &AnswerFilter,
        ctx: &RequestContext,
    ) -> Result<Select<answer::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(answer::Column::Id.is_in(ids.clone()));
        }
        if let Some(question_id) = filter.question_id {
            select = select.filter(answer::Column::QuestionId.eq(question_id));
        }
        if let Some(user_id) = filter.user_id {
            select = select.filter(answer::Column::UserId.eq(user_id));
        }
        Ok(Self::scope(select, ctx))
    }

    /// Owner, question and grading columns never change through the API.
    fn update_query(
        update: UpdateMany<answer::Entity>,
        mut changes: answer::ActiveModel,
        id: i32,
        ctx: &RequestContext,
    ) -> UpdateMany<answer::Entity> {
        for column in ["id", "created_at", "user_id", "question_id", "points", "points_granted_at"] {
            if let Ok(column) = answer::Column::from_str(column) {
                changes.not_set(column);
            }
        }
        let update = update
            .set(changes)
            .filter(answer::Column::Id.eq(id))
            .filter(answer::Column::PointsGrantedAt.is_null());
        Self::scope(update, ctx)
    }

    /// Graded answers are never deleted through the API.
    fn delete_query(
        delete: DeleteMany<answer::Entity>,
        id: i32,
        ctx: &RequestContext,
    ) -> DeleteMany<answer::Entity> {
        let delete = delete
            .filter(answer::Column::Id.eq(id))
            .filter(answer::Column::PointsGrantedAt.is_null());
        Self::scope(delete, ctx)
    }

    fn to_active_model(payload: &AnswerPayload, ctx: &RequestContext) -> answer::ActiveModel {
        answer::ActiveModel {
            user_id: Set(ctx.user.id),
            question_id: Set(payload.question_id),
            content: Set(payload.content.clone()),
            points: Set(0),
            ..Default::default()
        }
    }

    async fn validate(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        payload: &AnswerPayload,
        action: Action,
    ) -> Result<(), AppError> {
        let question_id = match action {
            Action::Create => payload.question_id,
            Action::Update(id) => Self::editable(txn, ctx, id).await?.question_id,
        };

        let (question, event) = question_with_event(txn, question_id)
            .await?
            .ok_or_else(|| AppError::field("question_id", "id_of", "question does not exist"))?;
        if event.is_closed(ctx.now) {
            return Err(AppError::field("question_id", EVENT_CLOSED, EVENT_CLOSED_MSG));
        }

        check_content(txn, &question.kind, &payload.content, "content").await?;

        if action == Action::Create {
            let earlier = answer::Entity::find()
                .filter(answer::Column::UserId.eq(ctx.user.id))
                .filter(answer::Column::QuestionId.eq(question.id))
                .one(txn)
                .await?;
            if earlier.is_some() {
                return Err(AppError::field("question_id", "already_answered", ALREADY_ANSWERED));
            }
        }

        Ok(())
    }

    async fn before_delete(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        Self::editable(txn, ctx, id).await.map(|_| ())
    }

    fn write_error(err: DbErr) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::field("question_id", "already_answered", ALREADY_ANSWERED)
            }
            _ => err.into(),
        }
    }

    async fn load(
        _db: &DatabaseConnection,
        models: Vec<answer::Model>,
    ) -> Result<Vec<answer::Model>, DbErr> {
        Ok(models)
    }

    fn shape(record: answer::Model) -> answer::Model {
        record
    }
}
