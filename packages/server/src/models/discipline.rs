use serde::Deserialize;
use validator::Validate;

use super::shared::comma_separated;

#[derive(Debug, Deserialize, Validate)]
pub struct DisciplinePayload {
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisciplineFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
