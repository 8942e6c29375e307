use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A unit of background work, see `jobs::queue::JobQueue`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub kind: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub args: Json,
    /// One of `common::JobState`.
    pub state: String,
    pub attempt: i32,
    pub max_attempts: i32,
    /// History of failed attempts: [{attempt, error, timestamp}]
    #[sea_orm(column_type = "JsonBinary")]
    pub errors: Json,

    pub scheduled_at: DateTimeUtc,
    pub attempted_at: Option<DateTimeUtc>,
    pub finalized_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
