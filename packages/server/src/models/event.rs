use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use super::shared::comma_separated;

#[derive(Debug, Deserialize, Validate)]
pub struct EventPayload {
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    /// `true` keeps events whose deadline has not passed, `false` the closed ones.
    pub active: Option<bool>,
}
