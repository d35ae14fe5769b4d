// ABOUTME: Route module organization for the Vaultguard HTTP surface
// ABOUTME: Groups route definitions by domain with thin handlers delegating to core components
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

//! Route modules for the Vaultguard server
//!
//! Each domain module contains route definitions and thin handler functions
//! that delegate to the vault, credential pipeline, and database layers.
//! Protected modules rely on the tenant authorization middleware being
//! layered over them at router assembly.

/// Authentication routes
pub mod auth;

/// Health check and system status routes
pub mod health;

/// Integration credential routes (protected)
pub mod integrations;
