use async_trait::async_trait;
use common::PointsGranterArgs;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Select,
    Set,
};
use tracing::info;

use super::{EVENT_CLOSED, EVENT_CLOSED_MSG, check_content, question_with_event};
use crate::crud::{Action, RequestContext, Resource};
use crate::entity::{answer, event, question};
use crate::error::{AppError, FieldError};
use crate::models::answer::AnswerShape;
use crate::models::question::{QuestionFilter, QuestionPayload};

pub struct Questions;

#[async_trait]
impl Resource for Questions {
    type Entity = question::Entity;
    type Model = question::Model;
    type ActiveModel = question::ActiveModel;
    type Column = question::Column;
    type Payload = QuestionPayload;
    type Filter = QuestionFilter;
    type Record = question::Model;
    type Response = question::Model;

    fn id_column() -> question::Column {
        question::Column::Id
    }

    fn list_query(
        mut select: Select<question::Entity>,
        filter: &QuestionFilter,
        ctx: &RequestContext,
    ) -> Result<Select<question::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(question::Column::Id.is_in(ids.clone()));
        }
        if let Some(event_id) = filter.event_id {
            select = select.filter(question::Column::EventId.eq(event_id));
        }
        Ok(Self::scope(select, ctx))
    }

    /// An absent `correct_answer` leaves the stored one untouched.
    fn to_active_model(payload: &QuestionPayload, _ctx: &RequestContext) -> question::ActiveModel {
        let mut model = question::ActiveModel {
            event_id: Set(payload.event_id),
            content: Set(payload.content.clone()),
            kind: Set(payload.kind.clone()),
            points: Set(payload.points),
            ..Default::default()
        };
        if let Some(correct) = &payload.correct_answer {
            model.correct_answer = Set(Some(correct.clone()));
        }
        model
    }

    async fn validate(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        payload: &QuestionPayload,
        action: Action,
    ) -> Result<(), AppError> {
        if AnswerShape::from_type(&payload.kind).is_none() {
            return Err(AppError::field(
                "type",
                "oneof",
                format!("type must be one of: {}", AnswerShape::TYPES.join(", ")),
            ));
        }

        let target = event::Entity::find_by_id(payload.event_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::field("event_id", "id_of", "event does not exist"))?;

        match action {
            Action::Create => {
                if target.is_closed(ctx.now) {
                    return Err(AppError::field("event_id", EVENT_CLOSED, EVENT_CLOSED_MSG));
                }
                if payload.correct_answer.is_some() {
                    return Err(AppError::field(
                        "correct_answer",
                        "not_allowed",
                        "correct answer cannot be set when creating a question",
                    ));
                }
            }
            Action::Update(id) => {
                let existing = question::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or(AppError::NotFound)?;
                let current = event::Entity::find_by_id(existing.event_id)
                    .one(txn)
                    .await?
                    .ok_or(AppError::NotFound)?;

                // Once closed, only grading-related fields may change.
                if current.is_closed(ctx.now) || target.is_closed(ctx.now) {
                    let frozen: Vec<FieldError> = [
                        ("event_id", existing.event_id != payload.event_id),
                        ("content", existing.content != payload.content),
                        ("type", existing.kind != payload.kind),
                    ]
                    .into_iter()
                    .filter(|(_, changed)| *changed)
                    .map(|(path, _)| FieldError::new(path, EVENT_CLOSED, EVENT_CLOSED_MSG))
                    .collect();
                    if !frozen.is_empty() {
                        return Err(AppError::Validation(frozen));
                    }
                }

                if let Some(correct) = &payload.correct_answer {
                    check_content(txn, &payload.kind, correct, "correct_answer").await?;
                }
            }
        }

        Ok(())
    }

    /// Grading is scheduled in the same transaction whenever the stored or
    /// incoming correct answer meets a change to it or to `points`.
    async fn before_update(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        id: i32,
        payload: &QuestionPayload,
        _changes: &mut question::ActiveModel,
    ) -> Result<(), AppError> {
        let existing = question::Entity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let graded = payload.correct_answer.is_some() || existing.correct_answer.is_some();
        let regrade = payload.correct_answer.is_some() || payload.points != existing.points;

        if graded && regrade {
            let job = ctx
                .jobs
                .insert_tx(txn, &PointsGranterArgs { question_id: id })
                .await?;
            info!(question_id = id, job_id = job.id, "Scheduled points granting");
        }
        Ok(())
    }

    /// Questions of a closed event, and the answers under them, stay put.
    async fn before_delete(
        txn: &DatabaseTransaction,
        ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        if let Some((_, event)) = question_with_event(txn, id).await? {
            if event.is_closed(ctx.now) {
                return Err(AppError::field("event_id", EVENT_CLOSED, EVENT_CLOSED_MSG));
            }
        }
        answer::Entity::delete_many()
            .filter(answer::Column::QuestionId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn load(
        _db: &DatabaseConnection,
        models: Vec<question::Model>,
    ) -> Result<Vec<question::Model>, DbErr> {
        Ok(models)
    }

    fn shape(record: question::Model) -> question::Model {
        record
    }
}
