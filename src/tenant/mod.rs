// ABOUTME: Per-request tenant authorization context and scoped database access
// ABOUTME: Carries the authenticated identity and confines queries to one tenant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

/// Credential pipeline resolving stored integration secrets
pub mod credential_manager;

pub use credential_manager::{
    derive_connection_params, ConnectionParams, CredentialManager, IntegrationCredentials,
    IntegrationMode, SecretSource,
};

use crate::database::{CredentialData, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{CredentialRecord, CredentialStatus, TenantRole};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Authorization context established for a single request.
///
/// Built by the authorization middleware after authentication, tenant
/// resolution, and scope establishment all succeed. It is never cached or
/// shared across requests.
#[derive(Clone)]
pub struct AuthorizationContext {
    /// Tenant the request operates within
    pub tenant_id: Uuid,
    /// Human-readable tenant name
    pub tenant_name: String,
    /// Authenticated user
    pub user_id: Uuid,
    /// User's role in the tenant
    pub role: TenantRole,
    /// Database handle confined to this tenant
    pub db: TenantScopedDb,
}

impl AuthorizationContext {
    /// Require the owner role for privileged operations.
    ///
    /// # Errors
    ///
    /// Returns a permission error if the user is not a tenant owner
    pub fn require_owner(&self) -> AppResult<()> {
        if matches!(self.role, TenantRole::Owner) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "User {} does not have owner permission for tenant {}",
                self.user_id, self.tenant_id
            )))
        }
    }
}

impl fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("tenant_id", &self.tenant_id)
            .field("tenant_name", &self.tenant_name)
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Tenant-scoped database accessor.
///
/// Every query issued through this handle carries the tenant ID it was
/// created with, so handlers cannot reach another tenant's rows.
#[derive(Clone)]
pub struct TenantScopedDb {
    tenant_id: Uuid,
    database: Arc<Database>,
}

impl TenantScopedDb {
    /// Create a scoped handle. Callers must have confirmed the tenant scope
    /// against the database first.
    #[must_use]
    pub const fn new(tenant_id: Uuid, database: Arc<Database>) -> Self {
        Self {
            tenant_id,
            database,
        }
    }

    /// Tenant this handle is confined to.
    #[must_use]
    pub const fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    /// Get one integration credential for this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails
    pub async fn get_credential(
        &self,
        integration_name: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        self.database
            .get_integration_credential(self.tenant_id, integration_name)
            .await
    }

    /// List all integration credentials for this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing query fails
    pub async fn list_credentials(&self) -> AppResult<Vec<CredentialRecord>> {
        self.database
            .list_integration_credentials(self.tenant_id)
            .await
    }

    /// Create or replace an integration credential for this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_credential(
        &self,
        integration_name: &str,
        primary_secret: &str,
        secondary_secret: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> AppResult<()> {
        self.database
            .upsert_integration_credential(&CredentialData {
                tenant_id: self.tenant_id,
                integration_name,
                primary_secret,
                secondary_secret,
                metadata,
            })
            .await
    }

    /// Update the validation status of a stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential does not exist or the write fails
    pub async fn update_credential_status(
        &self,
        integration_name: &str,
        status: CredentialStatus,
    ) -> AppResult<()> {
        self.database
            .update_credential_status(self.tenant_id, integration_name, status)
            .await
    }

    /// Replace stored secret material without touching metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential does not exist or the write fails
    pub async fn update_credential_secrets(
        &self,
        integration_name: &str,
        primary_secret: &str,
        secondary_secret: Option<&str>,
    ) -> AppResult<()> {
        self.database
            .update_credential_secrets(
                self.tenant_id,
                integration_name,
                primary_secret,
                secondary_secret,
            )
            .await
    }
}

impl fmt::Debug for TenantScopedDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantScopedDb")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}
