// ABOUTME: Authentication route handlers for session token issuance
// ABOUTME: Verifies user credentials and returns signed JWTs with tenant hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::errors::{AppError, AppResult};
use crate::server::ServerResources;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use tracing::field::{display, Empty};
use tracing::{debug, info, warn, Span};

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Login response body
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed session token
    pub jwt_token: String,
    /// Token expiry as RFC 3339
    pub expires_at: String,
    /// Authenticated user summary
    pub user: UserInfo,
}

/// User summary returned on login
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID
    pub user_id: String,
    /// Account email
    pub email: String,
    /// Display name if set
    pub display_name: Option<String>,
    /// Default tenant the user will be scoped to, if any
    pub tenant_id: Option<String>,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle user login
    ///
    /// Failed lookups and wrong passwords share one response message so the
    /// endpoint does not reveal which accounts exist.
    #[tracing::instrument(skip(resources, request), fields(route = "login", user_id = Empty))]
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> AppResult<Response> {
        debug!("User login attempt");

        let user = resources
            .database
            .get_user_by_email(&request.email)
            .await
            .map_err(|e| {
                debug!(error = %e, "Login failed: user lookup error");
                AppError::unauthenticated("Invalid email or password")
            })?
            .ok_or_else(|| AppError::unauthenticated("Invalid email or password"))?;

        // Password hashing runs off the async executor
        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|_| AppError::unauthenticated("Invalid email or password"))?;

        if !is_valid {
            warn!("Invalid password for login attempt");
            return Err(AppError::unauthenticated("Invalid email or password"));
        }

        if !user.is_active {
            return Err(AppError::unauthenticated("User account is deactivated"));
        }

        let tenant_id = resources
            .database
            .list_tenants_for_user(user.id)
            .await
            .ok()
            .and_then(|tenants| tenants.first().map(|tenant| tenant.id));

        let jwt_token = resources.auth_manager.generate_token(&user)?;
        let expires_at = Utc::now() + Duration::hours(resources.auth_manager.expiry_hours());

        Span::current().record("user_id", display(user.id));
        info!("User logged in successfully");

        let response = LoginResponse {
            jwt_token,
            expires_at: expires_at.to_rfc3339(),
            user: UserInfo {
                user_id: user.id.to_string(),
                email: user.email,
                display_name: user.display_name,
                tenant_id: tenant_id.map(|id| id.to_string()),
            },
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
