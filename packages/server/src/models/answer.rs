use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::shared::comma_separated;
use crate::error::{AppError, FieldError};

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerPayload {
    pub question_id: i32,
    /// Must match the shape selected by the question's type.
    pub content: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnswerFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    pub question_id: Option<i32>,
    pub user_id: Option<i32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AthleteContent {
    value: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CountryContent {
    athlete_id_one: i32,
    athlete_id_two: i32,
    athlete_id_three: i32,
}

/// Content schema of answers (and correct answers), selected by question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    /// `{ "value": "<athlete name>" }`
    Athlete,
    /// Podium of athlete ids: `{ "athlete_id_one", "athlete_id_two", "athlete_id_three" }`.
    Country,
}

impl AnswerShape {
    pub const TYPES: [&'static str; 2] = ["athlete", "country"];

    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "athlete" => Some(AnswerShape::Athlete),
            "country" => Some(AnswerShape::Country),
            _ => None,
        }
    }

    /// Check the structure of `content`, reported under `path`.
    ///
    /// Returns the athlete references that must exist, as `(field path, id)`.
    pub fn check(&self, content: &Value, path: &str) -> Result<Vec<(String, i32)>, AppError> {
        match self {
            AnswerShape::Athlete => {
                let parsed: AthleteContent = decode(content, path, r#"{"value": string}"#)?;
                if parsed.value.trim().is_empty() {
                    return Err(AppError::field(
                        &format!("{path}.value"),
                        "required",
                        "must not be empty",
                    ));
                }
                Ok(Vec::new())
            }
            AnswerShape::Country => {
                let parsed: CountryContent = decode(
                    content,
                    path,
                    r#"{"athlete_id_one": id, "athlete_id_two": id, "athlete_id_three": id}"#,
                )?;
                let refs = [
                    ("athlete_id_one", parsed.athlete_id_one),
                    ("athlete_id_two", parsed.athlete_id_two),
                    ("athlete_id_three", parsed.athlete_id_three),
                ];

                let errors: Vec<FieldError> = refs
                    .iter()
                    .filter(|(_, id)| *id <= 0)
                    .map(|(field, _)| {
                        FieldError::new(&format!("{path}.{field}"), "min", "must be a positive id")
                    })
                    .collect();
                if !errors.is_empty() {
                    return Err(AppError::Validation(errors));
                }

                Ok(refs
                    .into_iter()
                    .map(|(field, id)| (format!("{path}.{field}"), id))
                    .collect())
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    content: &Value,
    path: &str,
    expected: &str,
) -> Result<T, AppError> {
    T::deserialize(content).map_err(|_| {
        AppError::field(path, "invalid_shape", format!("content must have the form {expected}"))
    })
}
