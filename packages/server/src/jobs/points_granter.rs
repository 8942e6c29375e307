use async_trait::async_trait;
use chrono::Utc;
use common::PointsGranterArgs;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde_json::Value;
use tracing::info;

use super::Worker;
use crate::entity::{answer, question};

/// Points for one answer: the full value on a structural match, else zero.
pub fn grade(content: &Value, correct: &Value, points: i32) -> i32 {
    if content == correct { points } else { 0 }
}

/// Grades every answer to a question against its correct answer.
///
/// Each run recomputes and overwrites `points` and `points_granted_at` for all
/// answers, so repeated or concurrent runs converge on the same result.
pub struct PointsGranter;

#[async_trait]
impl Worker for PointsGranter {
    type Args = PointsGranterArgs;

    async fn work(&self, db: &DatabaseConnection, args: PointsGranterArgs) -> anyhow::Result<()> {
        let txn = db.begin().await?;

        let Some(question) = question::Entity::find_by_id(args.question_id)
            .lock(LockType::Share)
            .one(&txn)
            .await?
        else {
            info!(question_id = args.question_id, "Question is gone, nothing to grant");
            return Ok(());
        };

        let Some(correct) = question.correct_answer.as_ref() else {
            info!(question_id = question.id, "Question has no correct answer yet");
            return Ok(());
        };

        let answers = answer::Entity::find()
            .filter(answer::Column::QuestionId.eq(question.id))
            .lock(LockType::Update)
            .all(&txn)
            .await?;

        let now = Utc::now();
        let graded = answers.len();
        let mut correct_count = 0usize;
        for answer in answers {
            let points = grade(&answer.content, correct, question.points);
            if points > 0 {
                correct_count += 1;
            }
            let mut active: answer::ActiveModel = answer.into();
            active.points = Set(points);
            active.points_granted_at = Set(Some(now));
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        txn.commit().await?;

        info!(
            question_id = question.id,
            graded,
            correct = correct_count,
            "Granted points"
        );
        Ok(())
    }
}
