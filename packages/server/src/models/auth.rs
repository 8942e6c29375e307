use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for self-registration.
#[derive(Deserialize, Validate, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice@example.com")]
    #[validate(email(code = "email", message = "must be a valid email"))]
    pub email: String,
    /// At least 6 characters.
    #[schema(example = "s3cure_P@ss!")]
    #[validate(length(min = 6, code = "min", message = "must be at least 6 characters"))]
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    #[validate(email(code = "email", message = "must be a valid email"))]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    #[validate(length(min = 1, code = "required", message = "must not be empty"))]
    pub password: String,
}

/// Successful login response.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token carrying the user id and role names.
    pub token: String,
}
