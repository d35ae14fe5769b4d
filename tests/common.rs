// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, server harness, and tenant seeding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::wildcard_in_or_patterns,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls
)]
//! Shared test utilities for `vaultguard`
//!
//! Common setup helpers to reduce duplication across integration tests.

use anyhow::Result;
use std::env;
use std::sync::{Arc, Once};
use tempfile::TempDir;
use uuid::Uuid;
use vaultguard::config::environment::MasterKey;
use vaultguard::database::Database;
use vaultguard::models::{Tenant, User};
use vaultguard::server::{ServerResources, VaultguardServer};
use vaultguard::test_utils::{test_master_key, test_server_config, test_tenant, test_user};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Connection string for a database file inside the given directory
pub fn test_database_url(dir: &TempDir) -> String {
    format!("sqlite:{}/vaultguard-test.db", dir.path().display())
}

/// Standard test database setup
///
/// File-backed: pooled connections to `sqlite::memory:` each open a private
/// database, so shared state across the pool needs a real file. The
/// returned directory guard must stay alive as long as the database.
pub async fn create_test_database() -> Result<(Arc<Database>, TempDir)> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let database = Arc::new(Database::new(&test_database_url(&dir)).await?);
    Ok((database, dir))
}

/// Server resources and router backed by a temporary database
pub struct TestHarness {
    pub resources: Arc<ServerResources>,
    pub app: axum::Router,
    _db_dir: TempDir,
}

impl TestHarness {
    /// Fresh copy of the router for another request
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }
}

/// Full harness with the vault master key configured
pub async fn create_test_harness() -> Result<TestHarness> {
    build_harness(Some(test_master_key()?)).await
}

/// Harness without a master key; vault writes fail with a config error
pub async fn create_test_harness_without_master_key() -> Result<TestHarness> {
    build_harness(None).await
}

async fn build_harness(master_key: Option<MasterKey>) -> Result<TestHarness> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let database_url = test_database_url(&dir);
    let database = Database::new(&database_url).await?;
    let config = test_server_config(&database_url, master_key);
    let resources = Arc::new(ServerResources::new(database, config));
    let app = VaultguardServer::router(&resources);

    Ok(TestHarness {
        resources,
        app,
        _db_dir: dir,
    })
}

/// Create an active user together with a tenant workspace they own
pub async fn create_user_with_tenant(database: &Database, email: &str) -> Result<(User, Tenant)> {
    let user = test_user(email)?;
    database.create_user(&user).await?;

    let slug = format!("test-tenant-{}", Uuid::new_v4());
    let tenant = test_tenant(&format!("Workspace for {email}"), &slug, user.id);
    database.create_tenant(&tenant).await?;

    Ok((user, tenant))
}

/// Create an active user with no tenant membership
pub async fn create_user_without_tenant(database: &Database, email: &str) -> Result<User> {
    let user = test_user(email)?;
    database.create_user(&user).await?;
    Ok(user)
}

/// Authorization header value carrying a fresh token for the user
pub fn bearer_for(resources: &ServerResources, user: &User) -> Result<String> {
    let token = resources.auth_manager.generate_token(user)?;
    Ok(format!("Bearer {token}"))
}

/// Delete a tenant row while leaving its membership rows behind
///
/// Foreign keys are switched off on a single acquired connection so the
/// orphaned membership survives; scope establishment then fails for this
/// tenant while membership resolution still succeeds.
pub async fn break_tenant_scope(database: &Database, tenant_id: Uuid) -> Result<()> {
    let mut conn = database.pool().acquire().await?;

    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(tenant_id.to_string())
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    Ok(())
}
