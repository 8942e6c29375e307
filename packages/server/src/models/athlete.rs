use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::shared::comma_separated;
use crate::entity::athlete;

#[derive(Debug, Deserialize, Validate)]
pub struct AthletePayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub country: String,
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub gender: String,
    /// Replaces the athlete's disciplines.
    #[serde(default)]
    pub discipline_ids: Vec<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AthleteFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    /// Whitespace separated terms, each matched against first or last name.
    pub search: Option<String>,
    /// Athletes practicing any of these disciplines.
    #[serde(default, deserialize_with = "comma_separated")]
    pub discipline_ids: Option<Vec<i32>>,
    pub country: Option<String>,
    pub gender: Option<String>,
}

/// An athlete with its disciplines flattened to names.
#[derive(Debug, Serialize, Deserialize)]
pub struct AthleteResponse {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub country: String,
    pub gender: String,
    pub disciplines: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AthleteResponse {
    pub fn new(athlete: athlete::Model, disciplines: Vec<String>) -> Self {
        Self {
            id: athlete.id,
            first_name: athlete.first_name,
            last_name: athlete.last_name,
            birthday: athlete.birthday,
            country: athlete.country,
            gender: athlete.gender,
            disciplines,
            created_at: athlete.created_at,
            updated_at: athlete.updated_at,
        }
    }
}
