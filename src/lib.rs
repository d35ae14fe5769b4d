// ABOUTME: Main library entry point for the Vaultguard multi-tenant credential core
// ABOUTME: Provides the secret vault, credential pipeline, and tenant authorization middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

// Crate-level attributes:
// - recursion_limit: raised from the default 128 for derive macros (serde,
//   thiserror) on nested response types
// - deny(unsafe_code): zero-tolerance unsafe policy
#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Vaultguard
//!
//! A multi-tenant credential vault and authorization core. Tenant secrets
//! are encrypted at rest with authenticated encryption, and every protected
//! request passes an ordered authorization chain before any handler runs.
//!
//! ## Components
//!
//! - **Vault**: authenticated encryption of secret strings with a
//!   self-describing, tamper-evident wire format
//! - **Credential pipeline**: loads tenant credentials, decrypts them (or
//!   passes legacy plaintext through), and derives connection parameters
//! - **Authorization middleware**: authenticates the caller, resolves the
//!   tenant, and establishes database scope before invoking handlers
//! - **Error taxonomy**: a closed set of error codes mapped to HTTP
//!   statuses, retry hints, and one uniform response shape
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vaultguard::config::environment::ServerConfig;
//! use vaultguard::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     // Load configuration
//!     let config = ServerConfig::from_env()?;
//!
//!     println!("Vaultguard configured with port: HTTP={}", config.http_port);
//!
//!     Ok(())
//! }
//! ```

/// Common data models for users, tenants, and credential records
pub mod models;

/// Configuration management from environment variables
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Authenticated encryption vault for secret storage
pub mod crypto;

/// Multi-tenant database management
pub mod database;

/// Authentication and session management
pub mod auth;

/// `HTTP` routes for login, health, and integration credentials
pub mod routes;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware for tenant authorization
pub mod middleware;

/// Health checks and monitoring
pub mod health;

/// Per-tenant rate limiting for credential writes
pub mod rate_limiting;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// HTTP server assembly and lifecycle
pub mod server;

/// Tenant-scoped data access and the credential pipeline
pub mod tenant;

/// Test utilities for creating consistent test data
#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
