use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;
use validator::Validate;

use crate::entity::role::DEFAULT_ROLE;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::models::user::UserResponse;
use crate::resources::user::{assign_roles, role_names};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new user",
    description = "Creates an account with the `user` role.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation error (validation_error, invalid_body)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(AppError::field("email", "unique", "email is already in use"));
    }

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        email: Set(email),
        password: Set(hash),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::field("email", "unique", "email is already in use")
        }
        _ => AppError::from(e),
    })?;
    assign_roles(&txn, user.id, &[DEFAULT_ROLE]).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user, vec![DEFAULT_ROLE.to_string()])),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges credentials for a bearer token carrying the user's roles.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (validation_error, invalid_body)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (login_error)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let roles = role_names(&state.db, vec![user.id])
        .await?
        .remove(&user.id)
        .unwrap_or_default();

    let token = jwt::sign(
        user.id,
        roles,
        chrono::Duration::hours(state.config.auth.token_ttl_hours),
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse { token }))
}
