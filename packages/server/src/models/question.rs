use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::shared::comma_separated;

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionPayload {
    pub event_id: i32,
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub content: String,
    /// Selects the answer shape, see [`super::answer::AnswerShape`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Rejected on create. Setting it on update schedules grading.
    pub correct_answer: Option<Value>,
    #[validate(range(min = 0, code = "min", message = "must not be negative"))]
    pub points: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    pub event_id: Option<i32>,
}
