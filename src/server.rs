// ABOUTME: HTTP server assembly wiring routes, middleware layers, and shared resources
// ABOUTME: Owns startup, router construction, and graceful shutdown handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::constants::defaults;
use crate::crypto::SecretVault;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::{tenant_authorization_middleware, RequestAuthorizer};
use crate::rate_limiting::CredentialWriteLimiter;
use crate::routes::auth::AuthRoutes;
use crate::routes::health::HealthRoutes;
use crate::routes::integrations::IntegrationRoutes;
use crate::tenant::CredentialManager;
use axum::{middleware, Router};
use std::future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{error, info, Level};

/// Shared state injected into route handlers.
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// Secret vault for credential encryption
    pub vault: Arc<SecretVault>,
    /// Session token manager
    pub auth_manager: Arc<AuthManager>,
    /// Credential pipeline
    pub credential_manager: CredentialManager,
    /// Per-tenant credential write limiter
    pub write_limiter: CredentialWriteLimiter,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble all shared components from a database and configuration.
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let vault = Arc::new(SecretVault::new(config.vault.master_key.clone()));
        let auth_manager = Arc::new(AuthManager::new(
            &config.auth.jwt_secret,
            config.auth.jwt_expiry_hours,
        ));
        let write_limiter = CredentialWriteLimiter::new(
            config.rate_limits.credential_write_limit,
            config.rate_limits.credential_write_window_secs,
        );

        Self {
            database: Arc::new(database),
            credential_manager: CredentialManager::new(Arc::clone(&vault)),
            vault,
            auth_manager,
            write_limiter,
            config: Arc::new(config),
        }
    }
}

/// The Vaultguard HTTP server.
pub struct VaultguardServer {
    resources: Arc<ServerResources>,
}

impl VaultguardServer {
    /// Create a server over the shared resources.
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the full application router.
    ///
    /// Integration routes sit behind the tenant authorization middleware;
    /// auth and health routes are public. Layers apply bottom-up, so the
    /// request ID layers and timeout wrap everything.
    #[must_use]
    pub fn router(resources: &Arc<ServerResources>) -> Router {
        let authorizer = Arc::new(RequestAuthorizer::new(
            Arc::clone(&resources.auth_manager),
            Arc::clone(&resources.database),
        ));

        let protected = IntegrationRoutes::routes(Arc::clone(resources)).layer(
            middleware::from_fn_with_state(authorizer, tenant_authorization_middleware),
        );

        Router::new()
            .merge(AuthRoutes::routes(Arc::clone(resources)))
            .merge(HealthRoutes::routes(resources))
            .merge(protected)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(
                        DefaultMakeSpan::new()
                            .level(Level::INFO)
                            .include_headers(false),
                    )
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TimeoutLayer::new(Duration::from_secs(
                defaults::REQUEST_TIMEOUT_SECS,
            )))
    }

    /// Bind the listen port and serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the transport fails
    pub async fn run(&self) -> AppResult<()> {
        let port = self.resources.config.http_port;
        let app = Self::router(&self.resources);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        info!("HTTP server listening on http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
