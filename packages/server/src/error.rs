use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::{Value, json};
use validator::ValidationErrors;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `validation_error`, `auth_header_missing`,
    /// `jwt_token_expired`, `not_found_error`, `internal_server_error`.
    #[schema(example = "validation_error")]
    pub error_type: &'static str,
    /// A message, or a list of [`FieldError`] for `validation_error`.
    #[schema(value_type = Object)]
    pub details: Value,
}

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    #[schema(example = "event_closed")]
    pub error_type: String,
    #[schema(example = "event is already closed")]
    pub details: String,
    #[schema(example = json!(["event_id"]))]
    pub path: Vec<String>,
}

impl FieldError {
    /// `path` is dot separated, e.g. `content.athlete_id_one`.
    pub fn new(path: &str, error_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            details: details.into(),
            path: path.split('.').map(str::to_string).collect(),
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    InvalidBody(String),
    InvalidQuery(String),
    NotFound,
    PathNotFound,
    AuthHeaderMissing,
    InvalidAuthHeader,
    TokenParsing(String),
    TokenExpired,
    InvalidClaims,
    UserNotFound,
    Forbidden,
    InvalidCredentials,
    Internal(String),
}

impl AppError {
    /// Single-field validation error.
    pub fn field(path: &str, error_type: &str, details: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(path, error_type, details)])
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, error_type, details) = match self {
            AppError::Validation(mut errors) => {
                errors.sort_by(|a, b| a.path.cmp(&b.path));
                (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    serde_json::to_value(errors).unwrap_or_default(),
                )
            }
            AppError::InvalidBody(msg) => (StatusCode::BAD_REQUEST, "invalid_body", json!(msg)),
            AppError::InvalidQuery(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_query_params", json!(msg))
            }
            AppError::NotFound => (
                StatusCode::BAD_REQUEST,
                "not_found_error",
                json!("record not found"),
            ),
            AppError::PathNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                json!("path not found"),
            ),
            AppError::AuthHeaderMissing => (
                StatusCode::UNAUTHORIZED,
                "auth_header_missing",
                json!("Authorization header is missing"),
            ),
            AppError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "invalid_auth_header",
                json!("Authorization header must have the form 'Bearer <token>'"),
            ),
            AppError::TokenParsing(msg) => {
                (StatusCode::UNAUTHORIZED, "jwt_parsing_error", json!(msg))
            }
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "jwt_token_expired",
                json!("token has expired"),
            ),
            AppError::InvalidClaims => (
                StatusCode::UNAUTHORIZED,
                "invalid_jwt_claims",
                json!("token claims are invalid"),
            ),
            AppError::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                "user_not_found",
                json!("user referenced by the token does not exist"),
            ),
            AppError::Forbidden => (
                StatusCode::UNAUTHORIZED,
                "action_forbidden",
                json!("you are not allowed to perform this action"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "login_error",
                json!("invalid email or password"),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_server_error",
                    json!("An unexpected error occurred"),
                )
            }
        };

        (status, ErrorBody { error_type, details })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let items = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    FieldError::new(
                        field.as_ref(),
                        e.code.to_string(),
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string()),
                    )
                })
            })
            .collect();
        AppError::Validation(items)
    }
}
