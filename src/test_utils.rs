// ABOUTME: Shared fixture constructors for integration tests
// ABOUTME: Builds deterministic users, tenants, configs, and vault keys without reading the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use chrono::Utc;
use uuid::Uuid;

use crate::config::environment::{
    AuthConfig, DatabaseConfig, MasterKey, RateLimitConfig, ServerConfig, VaultConfig,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, User};

/// Master key fixture: 64 hex characters, decoded to 32 key bytes
pub const TEST_MASTER_KEY_HEX: &str =
    "6fb1c3e2a4d5968700112233445566778899aabbccddeeff0011223344556677";

/// Password every [`test_user`] fixture is hashed with
pub const TEST_PASSWORD: &str = "password123";

/// Signing secret used by test configurations
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

/// Parse the fixture master key
///
/// # Errors
///
/// Returns a configuration error if the fixture constant fails validation
pub fn test_master_key() -> AppResult<MasterKey> {
    MasterKey::parse(TEST_MASTER_KEY_HEX)
}

/// Build a user fixture with a bcrypt hash of [`TEST_PASSWORD`]
///
/// # Errors
///
/// Returns an error if password hashing fails
pub fn test_user(email: &str) -> AppResult<User> {
    let password_hash = bcrypt::hash(TEST_PASSWORD, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash test password: {e}")))?;
    let now = Utc::now();
    Ok(User {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        password_hash,
        display_name: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Build a tenant fixture owned by the given user
#[must_use]
pub fn test_tenant(name: &str, slug: &str, owner_user_id: Uuid) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        slug: slug.to_owned(),
        owner_user_id,
        created_at: now,
        updated_at: now,
    }
}

/// Build a server configuration for tests
///
/// Ports, secrets, and limits are fixed values so tests never read the
/// process environment.
#[must_use]
pub fn test_server_config(database_url: &str, master_key: Option<MasterKey>) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database: DatabaseConfig {
            url: database_url.to_owned(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_expiry_hours: 24,
        },
        vault: VaultConfig { master_key },
        rate_limits: RateLimitConfig {
            credential_write_limit: 30,
            credential_write_window_secs: 3600,
        },
    }
}
