// ABOUTME: Environment-based server configuration with startup validation
// ABOUTME: Parses and validates ports, database URL, auth secrets, and the vault master key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use std::env;
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::constants::{defaults, env_config, master_key};
use crate::errors::{AppError, AppResult};

/// Complete server configuration assembled from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Session token settings
    pub auth: AuthConfig,
    /// Vault settings
    pub vault: VaultConfig,
    /// Per-tenant rate limit settings
    pub rate_limits: RateLimitConfig,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite:./data/vaultguard.db`
    pub url: String,
}

/// Session token settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .finish()
    }
}

/// Vault settings
///
/// The master key is optional so the server can boot unconfigured; vault
/// operations then fail with a configuration error until the key is set.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Validated master passphrase, when configured
    pub master_key: Option<MasterKey>,
}

/// Per-tenant rate limit settings
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Credential writes allowed per tenant per window
    pub credential_write_limit: u32,
    /// Window length in seconds
    pub credential_write_window_secs: i64,
}

/// Validated master passphrase for per-secret key derivation
///
/// Accepted forms: 64+ even-length hex characters (decoded to bytes) or a
/// raw value of at least 32 bytes. Validation happens once at config load;
/// only a SHA-256 fingerprint is ever logged.
#[derive(Clone)]
pub struct MasterKey {
    key_bytes: Zeroizing<Vec<u8>>,
    fingerprint: String,
}

impl MasterKey {
    /// Validate and normalize a raw passphrase value
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the value is empty or shorter
    /// than the accepted thresholds.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::config("Master key is empty"));
        }

        let is_hex = trimmed.len() >= master_key::MIN_HEX_LEN
            && trimmed.len() % 2 == 0
            && trimmed.chars().all(|c| c.is_ascii_hexdigit());

        let key_bytes = if is_hex {
            let decoded = hex::decode(trimmed)
                .map_err(|e| AppError::config(format!("Master key hex decode failed: {e}")))?;
            Zeroizing::new(decoded)
        } else if trimmed.len() >= master_key::MIN_RAW_LEN {
            Zeroizing::new(trimmed.as_bytes().to_vec())
        } else {
            return Err(AppError::config(format!(
                "Master key must be at least {} hex characters or {} raw bytes",
                master_key::MIN_HEX_LEN,
                master_key::MIN_RAW_LEN
            )));
        };

        let digest = Sha256::digest(key_bytes.as_slice());
        let fingerprint = hex::encode(&digest[..4]);

        Ok(Self {
            key_bytes,
            fingerprint,
        })
    }

    /// Key material fed into the per-secret KDF
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    /// Short SHA-256 fingerprint safe for logs
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl ServerConfig {
    /// Assemble the configuration from environment variables
    ///
    /// A missing master key is tolerated (the vault stays unconfigured); a
    /// present but malformed one fails startup.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - A numeric knob fails to parse
    /// - The JWT secret is unset
    /// - The master key is set but malformed
    pub fn from_env() -> AppResult<Self> {
        let http_port = parse_env(env_config::HTTP_PORT, defaults::HTTP_PORT)?;
        let database_url = env::var(env_config::DATABASE_URL)
            .unwrap_or_else(|_| defaults::DATABASE_URL.to_owned());

        let jwt_secret = env::var(env_config::JWT_SECRET).map_err(|_| {
            AppError::config(format!("{} must be set", env_config::JWT_SECRET))
        })?;
        let jwt_expiry_hours =
            parse_env(env_config::JWT_EXPIRY_HOURS, defaults::JWT_EXPIRY_HOURS)?;

        let master_key = match env::var(env_config::MASTER_KEY) {
            Ok(raw) => {
                let key = MasterKey::parse(&raw)?;
                info!(
                    fingerprint = %key.fingerprint(),
                    "Master encryption key loaded"
                );
                Some(key)
            }
            Err(_) => {
                warn!(
                    "{} not set; vault operations will fail until it is configured",
                    env_config::MASTER_KEY
                );
                None
            }
        };

        let credential_write_limit = parse_env(
            env_config::CREDENTIAL_WRITE_LIMIT,
            defaults::CREDENTIAL_WRITE_LIMIT,
        )?;
        let credential_write_window_secs = parse_env(
            env_config::CREDENTIAL_WRITE_WINDOW_SECS,
            defaults::CREDENTIAL_WRITE_WINDOW_SECS,
        )?;

        Ok(Self {
            http_port,
            database: DatabaseConfig { url: database_url },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours,
            },
            vault: VaultConfig { master_key },
            rate_limits: RateLimitConfig {
                credential_write_limit,
                credential_write_window_secs,
            },
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
