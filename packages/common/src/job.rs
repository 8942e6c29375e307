use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Payload of a background job. `KIND` routes the job to its handler.
pub trait JobArgs: Serialize + DeserializeOwned + Send + Sync {
    const KIND: &'static str;
}

/// Recompute the points of every answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsGranterArgs {
    pub question_id: i32,
}

impl JobArgs for PointsGranterArgs {
    const KIND: &'static str = "points_granter";
}

/// Lifecycle of a persisted job row.
///
/// `Available` and `Retryable` jobs are eligible for claiming once their
/// `scheduled_at` has passed. `Completed` and `Discarded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Available,
    Running,
    Retryable,
    Completed,
    Discarded,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Available => "available",
            JobState::Running => "running",
            JobState::Retryable => "retryable",
            JobState::Completed => "completed",
            JobState::Discarded => "discarded",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Discarded)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown job state: {0}")]
pub struct UnknownJobState(pub String);

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(JobState::Available),
            "running" => Ok(JobState::Running),
            "retryable" => Ok(JobState::Retryable),
            "completed" => Ok(JobState::Completed),
            "discarded" => Ok(JobState::Discarded),
            other => Err(UnknownJobState(other.to_string())),
        }
    }
}
