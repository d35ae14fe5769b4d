// ABOUTME: Server health monitoring and component status checks for operational visibility
// ABOUTME: Probes the database and vault configuration behind an unauthenticated endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

//! Health check probes and response types

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::service_names::VAULTGUARD;
use crate::crypto::SecretVault;
use crate::database::Database;

/// Overall service health
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components operational
    Healthy,
    /// Some components impaired but the service is available
    Degraded,
    /// Critical components failing
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Service uptime in seconds
    pub uptime_seconds: u64,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
    /// Response timestamp (Unix seconds)
    pub timestamp: i64,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Status description
    pub message: String,
}

/// Probes server components for the health endpoint.
pub struct HealthChecker {
    start_time: Instant,
    database: Arc<Database>,
    vault: Arc<SecretVault>,
}

impl HealthChecker {
    /// Create a checker over the shared database and vault.
    #[must_use]
    pub fn new(database: Arc<Database>, vault: Arc<SecretVault>) -> Self {
        Self {
            start_time: Instant::now(),
            database,
            vault,
        }
    }

    /// Run all component probes and aggregate an overall status.
    pub async fn check(&self) -> HealthResponse {
        let database = self.check_database().await;
        let vault = self.check_vault();

        let checks = vec![database, vault];
        let status = aggregate_status(&checks);

        HealthResponse {
            status,
            service: VAULTGUARD.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks,
            timestamp: Utc::now().timestamp(),
        }
    }

    async fn check_database(&self) -> ComponentHealth {
        match self.database.ping().await {
            Ok(()) => ComponentHealth {
                name: "database".to_owned(),
                status: HealthStatus::Healthy,
                message: "Database reachable".to_owned(),
            },
            Err(e) => ComponentHealth {
                name: "database".to_owned(),
                status: HealthStatus::Unhealthy,
                message: format!("Database ping failed: {e}"),
            },
        }
    }

    fn check_vault(&self) -> ComponentHealth {
        if self.vault.is_configured() {
            ComponentHealth {
                name: "vault".to_owned(),
                status: HealthStatus::Healthy,
                message: "Master encryption key loaded".to_owned(),
            }
        } else {
            ComponentHealth {
                name: "vault".to_owned(),
                status: HealthStatus::Degraded,
                message: "Master encryption key not configured; encrypted writes will fail"
                    .to_owned(),
            }
        }
    }
}

fn aggregate_status(checks: &[ComponentHealth]) -> HealthStatus {
    if checks
        .iter()
        .any(|check| check.status == HealthStatus::Unhealthy)
    {
        HealthStatus::Unhealthy
    } else if checks
        .iter()
        .any(|check| check.status == HealthStatus::Degraded)
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
