// ABOUTME: Shared constants for environment variables, defaults, and protocol limits
// ABOUTME: Centralizes configuration knob names so binaries, config, and tests agree
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// Environment variable names read by `ServerConfig::from_env`
pub mod env_config {
    /// Master passphrase the vault derives per-secret keys from
    pub const MASTER_KEY: &str = "VAULTGUARD_MASTER_KEY";
    /// HS256 signing secret for session tokens
    pub const JWT_SECRET: &str = "VAULTGUARD_JWT_SECRET";
    /// Session token lifetime in hours
    pub const JWT_EXPIRY_HOURS: &str = "VAULTGUARD_JWT_EXPIRY_HOURS";
    /// Database connection string
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Log output format selector ("text" or "json")
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    /// Credential writes allowed per tenant per window
    pub const CREDENTIAL_WRITE_LIMIT: &str = "VAULTGUARD_CREDENTIAL_WRITE_LIMIT";
    /// Credential write window length in seconds
    pub const CREDENTIAL_WRITE_WINDOW_SECS: &str = "VAULTGUARD_CREDENTIAL_WRITE_WINDOW_SECS";
}

/// Defaults applied when the environment leaves a knob unset
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 8081;
    /// Default SQLite database location
    pub const DATABASE_URL: &str = "sqlite:./data/vaultguard.db";
    /// Default session token lifetime
    pub const JWT_EXPIRY_HOURS: i64 = 24;
    /// Default credential writes per tenant per window
    pub const CREDENTIAL_WRITE_LIMIT: u32 = 30;
    /// Default credential write window length
    pub const CREDENTIAL_WRITE_WINDOW_SECS: i64 = 3600;
    /// Outer request timeout applied by the HTTP server
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Service identifiers used in logs and health responses
pub mod service_names {
    /// The server's canonical name
    pub const VAULTGUARD: &str = "vaultguard";
}

/// Master passphrase acceptance thresholds
pub mod master_key {
    /// Minimum length for a raw (non-hex) passphrase, in bytes
    pub const MIN_RAW_LEN: usize = 32;
    /// Minimum length for a hex-encoded passphrase, in characters
    pub const MIN_HEX_LEN: usize = 64;
}

/// Well-known protocol strings
pub mod protocol {
    /// Authorization header scheme prefix
    pub const BEARER_PREFIX: &str = "Bearer ";
}
