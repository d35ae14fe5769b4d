// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: All knobs come from environment variables; no config files or CLI flags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// Environment-based server configuration
pub mod environment;
