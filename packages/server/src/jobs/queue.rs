use std::time::Duration;

use chrono::{DateTime, Utc};
use common::retry::RetryAttempt;
use common::{JobArgs, JobState};
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entity::job;

/// Job table operations.
///
/// `claim` must run inside a transaction: the row locks it takes are what keep
/// two runners from claiming the same job.
pub struct JobQueue<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> JobQueue<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert<A: JobArgs>(
        &self,
        args: &A,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<job::Model, DbErr> {
        let args = serde_json::to_value(args)
            .map_err(|e| DbErr::Custom(format!("Failed to encode {} args: {e}", A::KIND)))?;

        job::ActiveModel {
            kind: Set(A::KIND.to_string()),
            args: Set(args),
            state: Set(JobState::Available.to_string()),
            attempt: Set(0),
            max_attempts: Set(max_attempts),
            errors: Set(serde_json::json!([])),
            scheduled_at: Set(now),
            attempted_at: Set(None),
            finalized_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Lock up to `limit` due jobs, skipping rows held by other runners, and
    /// mark them running.
    pub async fn claim(&self, limit: u64, now: DateTime<Utc>) -> Result<Vec<job::Model>, DbErr> {
        let due = job::Entity::find()
            .filter(
                job::Column::State.is_in([
                    JobState::Available.as_str(),
                    JobState::Retryable.as_str(),
                ]),
            )
            .filter(job::Column::ScheduledAt.lte(now))
            .order_by_asc(job::Column::ScheduledAt)
            .order_by_asc(job::Column::Id)
            .limit(limit)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(self.conn)
            .await?;

        let mut claimed = Vec::with_capacity(due.len());
        for job in due {
            let attempt = job.attempt + 1;
            let mut active: job::ActiveModel = job.into();
            active.state = Set(JobState::Running.to_string());
            active.attempt = Set(attempt);
            active.attempted_at = Set(Some(now));
            claimed.push(active.update(self.conn).await?);
        }

        Ok(claimed)
    }

    pub async fn complete(&self, id: i64, now: DateTime<Utc>) -> Result<(), DbErr> {
        self.finish(id, JobState::Completed, now).await
    }

    /// Record a failed attempt. Returns the state the job moved to.
    pub async fn fail(
        &self,
        job: &job::Model,
        error: &str,
        retry_in: Duration,
        now: DateTime<Utc>,
    ) -> Result<JobState, DbErr> {
        let mut history: Vec<RetryAttempt> =
            serde_json::from_value(job.errors.clone()).unwrap_or_default();
        history.push(RetryAttempt::new(job.attempt, error));
        let errors = serde_json::to_value(&history).unwrap_or_default();

        let (state, scheduled_at, finalized_at) = if job.attempt >= job.max_attempts {
            (JobState::Discarded, job.scheduled_at, Some(now))
        } else {
            let delay = chrono::Duration::milliseconds(retry_in.as_millis() as i64);
            (JobState::Retryable, now + delay, None)
        };

        job::Entity::update_many()
            .set(job::ActiveModel {
                state: Set(state.to_string()),
                errors: Set(errors),
                scheduled_at: Set(scheduled_at),
                finalized_at: Set(finalized_at),
                ..Default::default()
            })
            .filter(job::Column::Id.eq(job.id))
            .exec(self.conn)
            .await?;

        Ok(state)
    }

    /// Give up on a job without retrying.
    pub async fn discard(&self, id: i64, now: DateTime<Utc>) -> Result<(), DbErr> {
        self.finish(id, JobState::Discarded, now).await
    }

    /// Return jobs stuck in `running` since before `stale_before` to the queue.
    pub async fn rescue(
        &self,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = job::Entity::update_many()
            .set(job::ActiveModel {
                state: Set(JobState::Retryable.to_string()),
                scheduled_at: Set(now),
                ..Default::default()
            })
            .filter(job::Column::State.eq(JobState::Running.as_str()))
            .filter(job::Column::AttemptedAt.lt(stale_before))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn finish(&self, id: i64, state: JobState, now: DateTime<Utc>) -> Result<(), DbErr> {
        job::Entity::update_many()
            .set(job::ActiveModel {
                state: Set(state.to_string()),
                finalized_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(job::Column::Id.eq(id))
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
