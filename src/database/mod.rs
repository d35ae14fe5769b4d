// ABOUTME: Core database management with migration system for SQLite
// ABOUTME: Owns the connection pool and the tenant-scope instruction every request must pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// Integration credential storage per (tenant, integration) pair
pub mod integration_credentials;
/// Tenant and membership management
pub mod tenants;
/// User account management
pub mod users;

pub use integration_credentials::CredentialData;

use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection (internal implementation)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL is invalid or malformed
    /// - Database connection fails
    /// - `SQLite` file creation fails
    /// - Migration process fails
    async fn new_impl(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };

        db.migrate_impl()
            .await
            .map_err(|e| AppError::database(format!("Database migration failed: {e}")))?;

        Ok(db)
    }

    /// Create a new database connection (public API)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL is invalid or malformed
    /// - Database connection fails
    /// - `SQLite` file creation fails
    /// - Migration process fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        Self::new_impl(database_url).await
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run all database migrations (internal implementation)
    async fn migrate_impl(&self) -> AppResult<()> {
        info!("Running database migrations...");

        // Migrations are embedded at compile time so they are available
        // regardless of working directory
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Run all database migrations (public API)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any migration fails
    /// - Database connection is lost during migration
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_impl().await
    }

    /// Verify the database answers queries
    ///
    /// # Errors
    ///
    /// Returns an error if the round-trip fails
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Establish the tenant scope for a request
    ///
    /// This is the mandatory round-trip that must succeed before any
    /// tenant-scoped handler code runs. Both a failed query and a vanished
    /// tenant row classify as a scope failure, never as not-found.
    ///
    /// # Errors
    ///
    /// Returns an `RLS_CONTEXT_FAILURE` error if the round-trip fails or
    /// the tenant row cannot be confirmed.
    pub async fn establish_tenant_scope(&self, tenant_id: Uuid) -> AppResult<()> {
        let row = sqlx::query("SELECT id FROM tenants WHERE id = $1")
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::rls_context_failure(format!(
                    "Failed to establish tenant scope for {tenant_id}: {e}"
                ))
            })?;

        if row.is_none() {
            return Err(AppError::rls_context_failure(format!(
                "Tenant scope could not be confirmed for {tenant_id}"
            )));
        }

        Ok(())
    }
}
