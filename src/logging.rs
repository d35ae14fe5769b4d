// ABOUTME: Tracing subscriber initialization for structured server logging
// ABOUTME: Text or JSON output selected by LOG_FORMAT with RUST_LOG filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use std::env;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::constants::env_config;
use crate::errors::{AppError, AppResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output
    Text,
    /// Newline-delimited JSON for log shippers
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match env::var(env_config::LOG_FORMAT).as_deref() {
            Ok("json") | Ok("JSON") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` controls filtering (default `info`); `LOG_FORMAT=json`
/// switches to structured output.
///
/// # Errors
///
/// Returns a configuration error if a global subscriber is already installed.
pub fn init_from_env() -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init(),
    };

    result.map_err(|e| AppError::config(format!("Failed to initialize logging: {e}")))
}
