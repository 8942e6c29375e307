use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /ranking`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RankingParams {
    /// 1-based page number. Default: 1.
    pub page_no: Option<i64>,
    /// Page size, 1-100. Default: 20.
    pub per_page: Option<u64>,
    /// Only count answers to questions of this event.
    pub event_id: Option<i32>,
}

/// One row of the leaderboard.
#[derive(Debug, Serialize, Deserialize, FromQueryResult, utoipa::ToSchema)]
pub struct RankingEntry {
    #[schema(example = 12)]
    pub user_id: i32,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = 35)]
    pub total_points: i64,
}
