// ABOUTME: Protected integration credential routes for storing and inspecting tenant secrets
// ABOUTME: Every handler requires the authorization context established by the middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::errors::{AppError, AppResult};
use crate::models::CredentialStatus;
use crate::server::ServerResources;
use crate::tenant::{derive_connection_params, AuthorizationContext, ConnectionParams};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const MAX_INTEGRATION_NAME_LEN: usize = 64;

/// Request body for storing integration credentials
#[derive(Debug, Deserialize)]
pub struct StoreCredentialRequest {
    /// Integration the credential authenticates against
    pub integration_name: String,
    /// Primary API key
    pub api_key: String,
    /// Optional project or account identifier
    pub project_id: Option<String>,
    /// Connection metadata: region, base_url, mode
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Response body after storing a credential
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCredentialResponse {
    /// Integration the credential was stored for
    pub integration_name: String,
    /// Lifecycle status assigned to the stored credential
    pub status: CredentialStatus,
}

/// One stored credential, secrets omitted
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialSummary {
    /// Integration name
    pub integration_name: String,
    /// Whether the credential is active
    pub is_active: bool,
    /// Lifecycle status
    pub status: CredentialStatus,
    /// Whether the stored value is in the vault wire format
    pub encrypted: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Configuration status for one integration
#[derive(Debug, Serialize, Deserialize)]
pub struct IntegrationStatusResponse {
    /// Integration name
    pub integration_name: String,
    /// Whether an active credential is stored
    pub configured: bool,
    /// Derived connection parameters, when a credential exists
    pub params: Option<ConnectionParams>,
}

/// Result of the legacy re-encryption backfill
#[derive(Debug, Serialize, Deserialize)]
pub struct ReencryptResponse {
    /// Number of rows migrated to the vault wire format
    pub migrated: usize,
}

/// Authorization context echo for the calling request
#[derive(Debug, Serialize, Deserialize)]
pub struct ContextResponse {
    /// Tenant the request is scoped to
    pub tenant_id: String,
    /// Tenant name
    pub tenant_name: String,
    /// Authenticated user
    pub user_id: String,
    /// User's role in the tenant
    pub role: String,
}

/// Integration credential routes
pub struct IntegrationRoutes;

impl IntegrationRoutes {
    /// Create all integration routes
    ///
    /// The returned router must be layered with the tenant authorization
    /// middleware; handlers reject requests that reach them without a
    /// context.
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/integrations",
                get(Self::handle_list).post(Self::handle_store),
            )
            .route(
                "/api/integrations/:integration_name/status",
                get(Self::handle_status),
            )
            .route("/api/integrations/reencrypt", post(Self::handle_reencrypt))
            .route("/api/context", get(Self::handle_context))
            .with_state(resources)
    }

    /// List stored credentials for the requesting tenant, without secrets
    #[tracing::instrument(skip_all, fields(route = "list_integrations", tenant_id = %context.tenant_id))]
    async fn handle_list(
        context: AuthorizationContext,
    ) -> AppResult<Json<Vec<CredentialSummary>>> {
        let records = context.db.list_credentials().await?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            summaries.push(CredentialSummary {
                integration_name: record.integration_name,
                is_active: record.is_active,
                status: record.status,
                encrypted: record.primary_secret.is_encrypted(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            });
        }

        Ok(Json(summaries))
    }

    /// Encrypt and store a credential for the requesting tenant
    #[tracing::instrument(skip_all, fields(route = "store_integration", tenant_id = %context.tenant_id))]
    async fn handle_store(
        State(resources): State<Arc<ServerResources>>,
        context: AuthorizationContext,
        Json(request): Json<StoreCredentialRequest>,
    ) -> AppResult<Response> {
        let rate = resources.write_limiter.check(context.tenant_id);
        if rate.is_rate_limited {
            return Err(AppError::rate_limited(rate));
        }

        validate_integration_name(&request.integration_name)?;
        if request.api_key.is_empty() {
            return Err(AppError::invalid_input("api_key must not be empty"));
        }

        resources
            .credential_manager
            .store_credentials(
                &context.db,
                &request.integration_name,
                &request.api_key,
                request.project_id.as_deref(),
                &request.metadata,
            )
            .await?;

        let response = StoreCredentialResponse {
            integration_name: request.integration_name,
            status: CredentialStatus::Validating,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Report whether an integration is configured, with derived parameters
    #[tracing::instrument(skip_all, fields(route = "integration_status", tenant_id = %context.tenant_id))]
    async fn handle_status(
        context: AuthorizationContext,
        Path(integration_name): Path<String>,
    ) -> AppResult<Json<IntegrationStatusResponse>> {
        let record = context.db.get_credential(&integration_name).await?;
        let configured = record.as_ref().is_some_and(|record| record.is_active);
        let params = record
            .map(|record| derive_connection_params(&integration_name, &record.metadata));

        Ok(Json(IntegrationStatusResponse {
            integration_name,
            configured,
            params,
        }))
    }

    /// Re-encrypt legacy plaintext rows for the requesting tenant
    ///
    /// Owner-only; the backfill touches every credential row the tenant has.
    #[tracing::instrument(skip_all, fields(route = "reencrypt_integrations", tenant_id = %context.tenant_id))]
    async fn handle_reencrypt(
        State(resources): State<Arc<ServerResources>>,
        context: AuthorizationContext,
    ) -> AppResult<Json<ReencryptResponse>> {
        context.require_owner()?;

        let migrated = resources
            .credential_manager
            .reencrypt_legacy_credentials(&context.db)
            .await?;

        info!(migrated, "Legacy credential backfill completed");
        Ok(Json(ReencryptResponse { migrated }))
    }

    /// Echo the authorization context established for this request
    #[tracing::instrument(skip_all, fields(route = "context", tenant_id = %context.tenant_id))]
    async fn handle_context(context: AuthorizationContext) -> Json<ContextResponse> {
        Json(ContextResponse {
            tenant_id: context.tenant_id.to_string(),
            user_id: context.user_id.to_string(),
            role: context.role.as_db_string().to_owned(),
            tenant_name: context.tenant_name,
        })
    }
}

fn validate_integration_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::invalid_input("integration_name must not be empty"));
    }
    if name.len() > MAX_INTEGRATION_NAME_LEN {
        return Err(AppError::invalid_input(format!(
            "integration_name must be at most {MAX_INTEGRATION_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(AppError::invalid_input(
            "integration_name must contain only lowercase letters, digits, '_' or '-'",
        ));
    }
    Ok(())
}
