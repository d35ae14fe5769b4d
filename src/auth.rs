// ABOUTME: JWT session token management for authenticated API access
// ABOUTME: Issues and validates HS256 bearer tokens carrying the user identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::constants::protocol;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{Duration, Utc};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried inside a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID as a UUID string
    pub sub: String,
    /// Issued-at timestamp (Unix seconds)
    pub iat: i64,
    /// Expiry timestamp (Unix seconds)
    pub exp: i64,
}

/// Issues and validates JWT session tokens.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create a manager from the shared signing secret.
    #[must_use]
    pub fn new(jwt_secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            expiry_hours,
        }
    }

    /// Generate a signed token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if token signing fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validate a token signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, expired, or carries an
    /// invalid signature
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::unauthenticated(format!("Failed to validate token: {e}")))
    }

    /// Token lifetime in hours, used to report expiry to clients.
    #[must_use]
    pub const fn expiry_hours(&self) -> i64 {
        self.expiry_hours
    }
}

/// Extract the bearer token from request headers.
///
/// # Errors
///
/// Returns an error if the Authorization header is missing, is not valid
/// UTF-8, or does not use the Bearer scheme
pub fn extract_bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthenticated("Missing Authorization header"))?;

    let value = header
        .to_str()
        .map_err(|e| AppError::unauthenticated(format!("Invalid Authorization header: {e}")))?;

    value
        .strip_prefix(protocol::BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthenticated("Authorization header must use Bearer scheme"))
}
