use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::shared::comma_separated;
use crate::entity::role::RoleName;
use crate::entity::user;

/// Body of `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(email(code = "email", message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 6, code = "min", message = "must be at least 6 characters"))]
    pub password: String,
    /// Replaces the user's roles when present. New users default to `user`.
    #[validate(custom(function = "known_roles"))]
    pub roles: Option<Vec<String>>,
}

impl UserPayload {
    /// Requested roles, deduplicated. Only meaningful after validation.
    pub fn role_names(&self) -> Option<Vec<RoleName>> {
        self.roles.as_ref().map(|roles| {
            let mut names: Vec<RoleName> = roles
                .iter()
                .filter_map(|r| RoleName::from_str(r).ok())
                .collect();
            names.sort_by_key(|r| r.as_str());
            names.dedup();
            names
        })
    }
}

fn known_roles(roles: &Vec<String>) -> Result<(), ValidationError> {
    if roles.iter().all(|r| RoleName::from_str(r).is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("oneof").with_message("roles must be one of: admin, user, organizer".into()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub ids: Option<Vec<i32>>,
    /// Case-insensitive substring of the email.
    pub search: Option<String>,
}

/// A user without the password hash, roles flattened to names.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: user::Model, mut roles: Vec<String>) -> Self {
        roles.sort();
        Self {
            id: user.id,
            email: user.email,
            roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
