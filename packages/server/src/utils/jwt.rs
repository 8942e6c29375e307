use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,    // Expiration timestamp
    pub roles: Vec<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidClaims)
    }

    /// `admin` satisfies every requirement.
    pub fn has_role(&self, required: &str) -> bool {
        self.roles.iter().any(|r| r == "admin" || r == required)
    }
}

/// Sign a new HS256 token for a user.
pub fn sign(
    user_id: i32,
    roles: Vec<String>,
    ttl: Duration,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
        roles,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry of a token. Only the HMAC family is accepted.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(classify)
}

fn classify(err: jsonwebtoken::errors::Error) -> AppError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => AppError::InvalidClaims,
        _ => AppError::TokenParsing(err.to_string()),
    }
}
