// ABOUTME: Health check route exposing component status without authentication
// ABOUTME: Reports database reachability and vault configuration for probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::health::{HealthChecker, HealthStatus};
use crate::server::ServerResources;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use std::sync::Arc;

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health routes
    pub fn routes(resources: &Arc<ServerResources>) -> Router {
        let checker = Arc::new(HealthChecker::new(
            Arc::clone(&resources.database),
            Arc::clone(&resources.vault),
        ));
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(checker)
    }

    /// Handle the health probe
    ///
    /// A degraded service still answers 200 so load balancers keep routing;
    /// only a failing database turns the response into 503.
    async fn handle_health(State(checker): State<Arc<HealthChecker>>) -> Response {
        let report = checker.check().await;
        let status = match report.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(report)).into_response()
    }
}
