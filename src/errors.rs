// ABOUTME: Unified error taxonomy with standard error codes and HTTP response mapping
// ABOUTME: Every failure is classified into AppError and rendered to clients exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::rate_limiting::RateLimitInfo;

/// Result type used across all fallible production paths
pub type AppResult<T> = Result<T, AppError>;

/// Closed set of machine-readable error codes carried by every classified failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No identity could be established for the request
    Unauthenticated,
    /// Authenticated identity has no workspace membership
    NoWorkspace,
    /// Identity lacks the role a protected operation requires
    PermissionDenied,
    /// Tenant scope could not be established on the data handle
    RlsContextFailure,
    /// Caller-supplied data failed validation
    InvalidInput,
    /// Requested entity does not exist
    NotFound,
    /// Serialized secret does not match the vault wire format
    InvalidCiphertext,
    /// Authenticated decryption rejected the payload
    DecryptionFailed,
    /// Server-side configuration is missing or malformed
    ConfigError,
    /// Per-tenant quota exhausted for the current window
    RateLimitExceeded,
    /// Operation exceeded its deadline
    Timeout,
    /// A dependency upstream of this service failed
    UpstreamError,
    /// Database operation failed
    DatabaseError,
    /// Invariant violation inside this service
    InternalError,
    /// Untyped failure that escaped classification
    UnknownError,
}

impl ErrorCode {
    /// String form used in logs and response bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NoWorkspace => "NO_WORKSPACE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::RlsContextFailure => "RLS_CONTEXT_FAILURE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidCiphertext => "INVALID_CIPHERTEXT",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Timeout => "TIMEOUT",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether a failure with this code is safe to retry by default
    #[must_use]
    pub const fn default_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::Timeout | Self::UpstreamError
        )
    }
}

/// Fixed message rendered for failures that escaped classification
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred";

const HEADER_RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Classified application error
///
/// Produced anywhere in the stack, consumed exactly once by the
/// `IntoResponse` impl below. Response bodies carry the message and code
/// but never internal detail or secret material.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    /// Stable machine-readable code
    pub code: ErrorCode,
    /// Human-readable message rendered in the response body
    pub message: String,
    details: Option<Value>,
    retryable: Option<bool>,
    upstream_status: Option<u16>,
    rate_limit: Option<RateLimitInfo>,
}

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retryable: None,
            upstream_status: None,
            rate_limit: None,
        }
    }

    /// Missing or invalid identity (HTTP 401)
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Authenticated but without workspace membership (HTTP 403)
    pub fn no_workspace(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoWorkspace, message)
    }

    /// Role check failure on a protected operation (HTTP 403)
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Tenant scope establishment failure (HTTP 500)
    pub fn rls_context_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RlsContextFailure, message)
    }

    /// Caller-supplied data failed validation (HTTP 400)
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Requested entity does not exist (HTTP 404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Serialized secret failed the wire-format checks (HTTP 500)
    pub fn invalid_ciphertext(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCiphertext, message)
    }

    /// AEAD open rejected the payload (HTTP 500)
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecryptionFailed, message)
    }

    /// Missing or malformed server configuration (HTTP 503)
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Per-tenant quota exhausted (HTTP 429 with rate-limit headers)
    #[must_use]
    pub fn rate_limited(info: RateLimitInfo) -> Self {
        let mut err = Self::new(
            ErrorCode::RateLimitExceeded,
            format!("Rate limit of {} requests exceeded", info.limit),
        );
        err.rate_limit = Some(info);
        err
    }

    /// Deadline exceeded (HTTP 504)
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Upstream dependency failure; passes its status through when one exists
    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        let mut err = Self::new(ErrorCode::UpstreamError, message);
        err.upstream_status = status;
        err
    }

    /// Database operation failure (HTTP 500)
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal invariant violation (HTTP 500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Untyped failure caught at the handler boundary (HTTP 500, fixed message)
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(ErrorCode::UnknownError, UNKNOWN_ERROR_MESSAGE)
    }

    /// Attach structured context rendered under the `details` key
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the code's default retryability for this instance
    #[must_use]
    pub const fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    /// Whether the client may safely retry the failed request
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
            .unwrap_or_else(|| self.code.default_retryable())
    }

    /// HTTP status this error renders as
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self.code {
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::NoWorkspace | ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ConfigError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::UpstreamError => self
                .upstream_status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ErrorCode::RlsContextFailure
            | ErrorCode::InvalidCiphertext
            | ErrorCode::DecryptionFailed
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError
            | ErrorCode::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error indicates a server-side fault (logged at error level)
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RlsContextFailure
                | ErrorCode::InvalidCiphertext
                | ErrorCode::DecryptionFailed
                | ErrorCode::ConfigError
                | ErrorCode::DatabaseError
                | ErrorCode::InternalError
                | ErrorCode::UnknownError
        )
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::invalid_input(format!("Invalid UUID: {err}"))
    }
}

/// Wire shape of every error rendered to a client
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub error_code: ErrorCode,
    /// Optional structured context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Whether the client may safely retry
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();

        if self.is_server_fault() {
            error!(
                code = self.code.as_str(),
                status = status.as_u16(),
                "{}",
                self.message
            );
        } else {
            warn!(
                code = self.code.as_str(),
                status = status.as_u16(),
                "{}",
                self.message
            );
        }

        let body = ErrorResponse {
            error: self.message,
            error_code: self.code,
            details: self.details,
            retryable: self.retryable.unwrap_or_else(|| self.code.default_retryable()),
        };

        let mut response = (status, Json(body)).into_response();

        if let Some(info) = self.rate_limit {
            let headers = response.headers_mut();
            headers.insert(HEADER_RATE_LIMIT_LIMIT, HeaderValue::from(info.limit));
            headers.insert(
                HEADER_RATE_LIMIT_REMAINING,
                HeaderValue::from(info.remaining),
            );
            headers.insert(
                HEADER_RATE_LIMIT_RESET,
                HeaderValue::from(info.reset_at.timestamp()),
            );
        }

        response
    }
}
