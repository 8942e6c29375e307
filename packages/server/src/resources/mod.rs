//! [`Resource`](crate::crud::Resource) implementations, one per exposed entity.

pub mod answer;
pub mod athlete;
pub mod discipline;
pub mod event;
pub mod question;
pub mod user;

use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use serde_json::Value;

use crate::entity::{athlete as athlete_entity, event as event_entity, question as question_entity};
use crate::error::{AppError, FieldError};
use crate::models::answer::AnswerShape;

pub use answer::Answers;
pub use athlete::Athletes;
pub use discipline::Disciplines;
pub use event::Events;
pub use question::Questions;
pub use user::Users;

pub(crate) const EVENT_CLOSED: &str = "event_closed";
pub(crate) const EVENT_CLOSED_MSG: &str = "event is already closed";

/// Validate answer-shaped `content` for a question of type `kind`, including
/// that every athlete it references exists.
pub(crate) async fn check_content<C: ConnectionTrait>(
    conn: &C,
    kind: &str,
    content: &Value,
    path: &str,
) -> Result<(), AppError> {
    let shape = AnswerShape::from_type(kind).ok_or_else(|| {
        AppError::field(path, "invalid_shape", format!("unknown question type '{kind}'"))
    })?;
    let refs = shape.check(content, path)?;
    if refs.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = refs.iter().map(|(_, id)| *id).collect();
    let found = existing_ids::<athlete_entity::Entity, _, _>(conn, athlete_entity::Column::Id, ids).await?;

    let errors: Vec<FieldError> = refs
        .iter()
        .filter(|(_, id)| !found.contains(id))
        .map(|(path, _)| FieldError::new(path, "id_of", "athlete does not exist"))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// The subset of `ids` present in `column`.
pub(crate) async fn existing_ids<E, C, Conn>(
    conn: &Conn,
    column: C,
    ids: Vec<i32>,
) -> Result<HashSet<i32>, DbErr>
where
    E: EntityTrait<Column = C>,
    C: ColumnTrait,
    Conn: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let found = E::find()
        .select_only()
        .column(column)
        .filter(column.is_in(ids))
        .into_tuple::<i32>()
        .all(conn)
        .await?;
    Ok(found.into_iter().collect())
}

/// A question together with the event it belongs to.
pub(crate) async fn question_with_event<C: ConnectionTrait>(
    conn: &C,
    question_id: i32,
) -> Result<Option<(question_entity::Model, event_entity::Model)>, DbErr> {
    let found = question_entity::Entity::find_by_id(question_id)
        .find_also_related(event_entity::Entity)
        .one(conn)
        .await?;
    Ok(found.and_then(|(question, event)| event.map(|event| (question, event))))
}
