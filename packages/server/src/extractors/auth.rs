use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, Claims};

/// Bearer token whose signature and expiry have been verified.
///
/// Role checks and user resolution happen in `crud::RequestContext::authorize`,
/// after the token itself is known to be valid.
pub struct VerifiedToken(pub Claims);

/// Split an `Authorization` header value into its token.
///
/// Exactly two space separated parts are accepted and the scheme is matched
/// case-insensitively.
pub fn bearer_token(header: &str) -> Result<&str, AppError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AppError::InvalidAuthHeader),
    }
}

impl FromRequestParts<AppState> for VerifiedToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .ok_or(AppError::AuthHeaderMissing)?
            .to_str()
            .map_err(|_| AppError::InvalidAuthHeader)?;

        if header.is_empty() {
            return Err(AppError::AuthHeaderMissing);
        }

        let token = bearer_token(header)?;
        let claims = jwt::verify(token, &state.config.auth.jwt_secret)?;

        Ok(VerifiedToken(claims))
    }
}
