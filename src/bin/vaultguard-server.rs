// ABOUTME: Vaultguard server binary entry point
// ABOUTME: Loads configuration from the environment, runs migrations, and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

//! # Vaultguard Server
//!
//! Starts the multi-tenant credential vault server. All configuration comes
//! from environment variables; see `constants::env_config` for the full set.
//!
//! ## Usage
//!
//! ```bash
//! VAULTGUARD_JWT_SECRET=change-me \
//! VAULTGUARD_MASTER_KEY=<64+ hex chars or 32+ raw bytes> \
//! cargo run --bin vaultguard-server
//! ```

use std::sync::Arc;

use tracing::info;

use vaultguard::config::environment::ServerConfig;
use vaultguard::database::Database;
use vaultguard::errors::AppResult;
use vaultguard::logging;
use vaultguard::server::{ServerResources, VaultguardServer};

#[tokio::main]
async fn main() -> AppResult<()> {
    logging::init_from_env()?;

    info!("=== Vaultguard Server ===");

    let config = ServerConfig::from_env()?;
    let database = Database::new(&config.database.url).await?;

    let resources = Arc::new(ServerResources::new(database, config));
    VaultguardServer::new(resources).run().await
}
