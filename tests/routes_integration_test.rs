// ABOUTME: HTTP-level integration tests for login, credential, status, and health routes
// ABOUTME: Exercises the full router with real tokens against a temporary database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{
    bearer_for, create_test_harness, create_test_harness_without_master_key,
    create_user_with_tenant, create_user_without_tenant, init_test_logging, test_database_url,
};
use helpers::axum_test::AxumTestRequest;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use vaultguard::database::Database;
use vaultguard::errors::{ErrorCode, ErrorResponse};
use vaultguard::health::{HealthResponse, HealthStatus};
use vaultguard::models::{CredentialStatus, TenantRole};
use vaultguard::routes::auth::LoginResponse;
use vaultguard::routes::integrations::{
    CredentialSummary, IntegrationStatusResponse, ReencryptResponse, StoreCredentialResponse,
};
use vaultguard::server::{ServerResources, VaultguardServer};
use vaultguard::tenant::{IntegrationMode, TenantScopedDb};
use vaultguard::test_utils::{test_master_key, test_server_config, TEST_PASSWORD};

use axum::http::StatusCode;

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_and_tenant_hint() {
    let harness = create_test_harness().await.unwrap();
    let (user, tenant) = create_user_with_tenant(&harness.resources.database, "login@example.com")
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({"email": "login@example.com", "password": TEST_PASSWORD}))
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let login: LoginResponse = response.json();
    assert!(!login.jwt_token.is_empty());
    assert_eq!(login.user.user_id, user.id.to_string());
    assert_eq!(login.user.email, "login@example.com");
    assert_eq!(login.user.tenant_id, Some(tenant.id.to_string()));

    let expires_at = DateTime::parse_from_rfc3339(&login.expires_at).unwrap();
    assert!(expires_at > Utc::now());

    // The issued token authorizes protected routes
    let response = AxumTestRequest::get("/api/context")
        .header("authorization", &format!("Bearer {}", login.jwt_token))
        .send(harness.app())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let harness = create_test_harness().await.unwrap();
    create_user_with_tenant(&harness.resources.database, "login@example.com")
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({"email": "login@example.com", "password": "wrong-password"}))
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error_code, ErrorCode::Unauthenticated);
    assert_eq!(body.error, "Invalid email or password");
}

#[tokio::test]
async fn test_login_does_not_reveal_which_accounts_exist() {
    let harness = create_test_harness().await.unwrap();
    create_user_with_tenant(&harness.resources.database, "real@example.com")
        .await
        .unwrap();

    let wrong_password = AxumTestRequest::post("/api/auth/login")
        .json(&json!({"email": "real@example.com", "password": "wrong-password"}))
        .send(harness.app())
        .await;
    let unknown_email = AxumTestRequest::post("/api/auth/login")
        .json(&json!({"email": "ghost@example.com", "password": "wrong-password"}))
        .send(harness.app())
        .await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);
    let wrong_body: ErrorResponse = wrong_password.json();
    let unknown_body: ErrorResponse = unknown_email.json();
    assert_eq!(wrong_body.error, unknown_body.error);
}

// ============================================================================
// Storing Credentials
// ============================================================================

#[tokio::test]
async fn test_store_credential_round_trips_through_api() {
    let harness = create_test_harness().await.unwrap();
    let (user, _tenant) = create_user_with_tenant(&harness.resources.database, "store@example.com")
        .await
        .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let response = AxumTestRequest::post("/api/integrations")
        .header("authorization", &bearer)
        .json(&json!({
            "integration_name": "stripe",
            "api_key": "sk_live_abc123",
            "project_id": "proj_42"
        }))
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let stored: StoreCredentialResponse = response.json();
    assert_eq!(stored.integration_name, "stripe");
    assert_eq!(stored.status, CredentialStatus::Validating);

    let response = AxumTestRequest::get("/api/integrations")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let summaries: Vec<CredentialSummary> = response.json();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].integration_name, "stripe");
    assert!(summaries[0].is_active);
    assert!(summaries[0].encrypted);
    assert_eq!(summaries[0].status, CredentialStatus::Validating);
}

#[tokio::test]
async fn test_store_rejects_empty_api_key() {
    let harness = create_test_harness().await.unwrap();
    let (user, _tenant) = create_user_with_tenant(&harness.resources.database, "store@example.com")
        .await
        .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let response = AxumTestRequest::post("/api/integrations")
        .header("authorization", &bearer)
        .json(&json!({"integration_name": "stripe", "api_key": ""}))
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error_code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_store_rejects_invalid_integration_names() {
    let harness = create_test_harness().await.unwrap();
    let (user, _tenant) = create_user_with_tenant(&harness.resources.database, "store@example.com")
        .await
        .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let too_long = "a".repeat(65);
    let bad_names = ["", too_long.as_str(), "Stripe", "my stripe", "stripe!"];

    for name in bad_names {
        let response = AxumTestRequest::post("/api/integrations")
            .header("authorization", &bearer)
            .json(&json!({"integration_name": name, "api_key": "sk_live_abc123"}))
            .send(harness.app())
            .await;

        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "name {name:?} should be rejected"
        );
        let body: ErrorResponse = response.json();
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
    }
}

#[tokio::test]
async fn test_store_without_master_key_is_config_error() {
    let harness = create_test_harness_without_master_key().await.unwrap();
    let (user, _tenant) = create_user_with_tenant(&harness.resources.database, "nokey@example.com")
        .await
        .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let response = AxumTestRequest::post("/api/integrations")
        .header("authorization", &bearer)
        .json(&json!({"integration_name": "stripe", "api_key": "sk_live_abc123"}))
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error_code, ErrorCode::ConfigError);

    // Reads never touch the vault, so listing still works
    let response = AxumTestRequest::get("/api/integrations")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let summaries: Vec<CredentialSummary> = response.json();
    assert!(summaries.is_empty());
}

// ============================================================================
// Integration Status
// ============================================================================

#[tokio::test]
async fn test_status_reports_params_for_configured_integration() {
    let harness = create_test_harness().await.unwrap();
    let (user, _tenant) =
        create_user_with_tenant(&harness.resources.database, "status@example.com")
            .await
            .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let response = AxumTestRequest::post("/api/integrations")
        .header("authorization", &bearer)
        .json(&json!({
            "integration_name": "stripe",
            "api_key": "sk_live_abc123",
            "metadata": {"region": "eu"}
        }))
        .send(harness.app())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = AxumTestRequest::get("/api/integrations/stripe/status")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let status: IntegrationStatusResponse = response.json();
    assert_eq!(status.integration_name, "stripe");
    assert!(status.configured);
    let params = status.params.unwrap();
    assert_eq!(params.base_url, "https://eu.api.stripe.com");
    assert_eq!(params.mode, IntegrationMode::Live);
}

#[tokio::test]
async fn test_status_for_unknown_integration_is_not_configured() {
    let harness = create_test_harness().await.unwrap();
    let (user, _tenant) =
        create_user_with_tenant(&harness.resources.database, "status@example.com")
            .await
            .unwrap();
    let bearer = bearer_for(&harness.resources, &user).unwrap();

    let response = AxumTestRequest::get("/api/integrations/sendgrid/status")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let status: IntegrationStatusResponse = response.json();
    assert_eq!(status.integration_name, "sendgrid");
    assert!(!status.configured);
    assert!(status.params.is_none());
}

// ============================================================================
// Re-encryption Backfill
// ============================================================================

#[tokio::test]
async fn test_reencrypt_requires_owner_role() {
    let harness = create_test_harness().await.unwrap();
    let (owner, tenant) = create_user_with_tenant(&harness.resources.database, "owner@example.com")
        .await
        .unwrap();
    let member = create_user_without_tenant(&harness.resources.database, "member@example.com")
        .await
        .unwrap();
    harness
        .resources
        .database
        .add_tenant_member(tenant.id, member.id, TenantRole::Member)
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/integrations/reencrypt")
        .header(
            "authorization",
            &bearer_for(&harness.resources, &member).unwrap(),
        )
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error_code, ErrorCode::PermissionDenied);

    let response = AxumTestRequest::post("/api/integrations/reencrypt")
        .header(
            "authorization",
            &bearer_for(&harness.resources, &owner).unwrap(),
        )
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result: ReencryptResponse = response.json();
    assert_eq!(result.migrated, 0);
}

#[tokio::test]
async fn test_reencrypt_migrates_legacy_rows_via_api() {
    let harness = create_test_harness().await.unwrap();
    let (owner, tenant) =
        create_user_with_tenant(&harness.resources.database, "legacy@example.com")
            .await
            .unwrap();
    let bearer = bearer_for(&harness.resources, &owner).unwrap();

    // A row written before encryption rollout holds the raw key
    let scope = TenantScopedDb::new(tenant.id, Arc::clone(&harness.resources.database));
    scope
        .upsert_credential("billing", "legacy_key_987", None, &HashMap::new())
        .await
        .unwrap();

    let response = AxumTestRequest::get("/api/integrations")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;
    let summaries: Vec<CredentialSummary> = response.json();
    assert_eq!(summaries.len(), 1);
    assert!(!summaries[0].encrypted);

    let response = AxumTestRequest::post("/api/integrations/reencrypt")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let result: ReencryptResponse = response.json();
    assert_eq!(result.migrated, 1);

    let response = AxumTestRequest::get("/api/integrations")
        .header("authorization", &bearer)
        .send(harness.app())
        .await;
    let summaries: Vec<CredentialSummary> = response.json();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].encrypted);
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[tokio::test]
async fn test_credential_write_rate_limit_renders_headers() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let database_url = test_database_url(&dir);
    let database = Database::new(&database_url).await.unwrap();

    let mut config = test_server_config(&database_url, Some(test_master_key().unwrap()));
    config.rate_limits.credential_write_limit = 2;
    let resources = Arc::new(ServerResources::new(database, config));
    let app = VaultguardServer::router(&resources);

    let (user, _tenant) = create_user_with_tenant(&resources.database, "burst@example.com")
        .await
        .unwrap();
    let bearer = bearer_for(&resources, &user).unwrap();

    for i in 0..2 {
        let response = AxumTestRequest::post("/api/integrations")
            .header("authorization", &bearer)
            .json(&json!({
                "integration_name": format!("conn-{i}"),
                "api_key": "sk_live_abc123"
            }))
            .send(app.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let response = AxumTestRequest::post("/api/integrations")
        .header("authorization", &bearer)
        .json(&json!({"integration_name": "conn-2", "api_key": "sk_live_abc123"}))
        .send(app)
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let headers = response.headers();
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "2");
    assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
    let reset: i64 = headers
        .get("x-ratelimit-reset")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(reset >= Utc::now().timestamp());

    let body: ErrorResponse = response.json();
    assert_eq!(body.error_code, ErrorCode::RateLimitExceeded);
    assert!(body.retryable);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_healthy_with_master_key() {
    let harness = create_test_harness().await.unwrap();

    let response = AxumTestRequest::get("/health").send(harness.app()).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let health: HealthResponse = response.json();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.service, "vaultguard");
    assert_eq!(health.checks.len(), 2);
    assert!(health
        .checks
        .iter()
        .all(|check| check.status == HealthStatus::Healthy));
}

#[tokio::test]
async fn test_health_reports_degraded_without_master_key() {
    let harness = create_test_harness_without_master_key().await.unwrap();

    let response = AxumTestRequest::get("/health").send(harness.app()).await;

    // Degraded still answers 200 so load balancers keep routing
    assert_eq!(response.status_code(), StatusCode::OK);
    let health: HealthResponse = response.json();
    assert_eq!(health.status, HealthStatus::Degraded);

    let vault_check = health
        .checks
        .iter()
        .find(|check| check.name == "vault")
        .unwrap();
    assert_eq!(vault_check.status, HealthStatus::Degraded);
}
