// ABOUTME: HTTP middleware layers applied around protected route handlers
// ABOUTME: Hosts the tenant authorization chain that gates every handler invocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// Tenant authorization chain run before protected handlers
pub mod authorization;

pub use authorization::{
    tenant_authorization_middleware, AuthorizationStage, RequestAuthorizer, AUTHORIZATION_CHAIN,
};
