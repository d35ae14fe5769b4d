// ABOUTME: Credential pipeline resolving stored integration secrets for handlers
// ABOUTME: Decrypts vault-format rows, passes legacy plaintext through, derives connection params
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::crypto::SecretVault;
use crate::errors::AppResult;
use crate::models::StoredSecret;
use crate::tenant::TenantScopedDb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Metadata keys recognized by connection parameter derivation
mod metadata_keys {
    pub const BASE_URL: &str = "base_url";
    pub const REGION: &str = "region";
    pub const MODE: &str = "mode";
}

/// Whether an integration runs against production or sandbox endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMode {
    /// Production traffic
    Live,
    /// Sandbox traffic
    Test,
}

impl IntegrationMode {
    fn from_metadata(value: Option<&str>) -> Self {
        match value {
            None | Some("live") => Self::Live,
            Some("test") => Self::Test,
            Some(other) => {
                warn!(mode = %other, "Unrecognized integration mode, defaulting to live");
                Self::Live
            }
        }
    }

    /// Lowercase wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
        }
    }
}

/// Connection parameters derived from credential metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Canonical endpoint for the integration's API
    pub base_url: String,
    /// Production or sandbox mode
    pub mode: IntegrationMode,
}

/// Storage form the secret material was read from.
///
/// `Plaintext` marks a legacy row that predates encrypted storage and is
/// awaiting the re-encryption backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// Legacy row stored before encryption was introduced
    Plaintext,
    /// Row in the vault wire format
    Encrypted,
}

/// Resolved credentials ready for an outbound integration call.
#[derive(Clone)]
pub struct IntegrationCredentials {
    /// Primary API key in plaintext
    pub api_key: String,
    /// Optional project or account identifier
    pub project_id: Option<String>,
    /// Derived connection parameters
    pub params: ConnectionParams,
    /// Which storage form the secrets came from
    pub source: SecretSource,
}

impl fmt::Debug for IntegrationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationCredentials")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id.as_ref().map(|_| "<redacted>"))
            .field("params", &self.params)
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves integration credentials for request handlers.
///
/// The vault is injected at construction; the tenant-scoped database handle
/// arrives per call so every lookup is confined to the requesting tenant.
pub struct CredentialManager {
    vault: Arc<SecretVault>,
}

impl CredentialManager {
    /// Create a manager backed by the given vault.
    #[must_use]
    pub const fn new(vault: Arc<SecretVault>) -> Self {
        Self { vault }
    }

    /// Load and decrypt credentials for one integration.
    ///
    /// Rows in the vault wire format are decrypted; legacy plaintext rows are
    /// returned as stored without touching the vault. A missing row is
    /// `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails or if a vault-format row
    /// fails to parse or decrypt. Decryption failure is terminal for the
    /// lookup; there is no fallback to a default value.
    pub async fn get_credentials(
        &self,
        scope: &TenantScopedDb,
        integration_name: &str,
    ) -> AppResult<Option<IntegrationCredentials>> {
        let Some(record) = scope.get_credential(integration_name).await? else {
            return Ok(None);
        };

        let params = derive_connection_params(integration_name, &record.metadata);

        // The primary value's storage form decides the path for the whole record.
        let (api_key, project_id, source) = if record.primary_secret.is_encrypted() {
            let secondary = record.secondary_secret.as_ref().map(StoredSecret::as_str);
            let (api_key, project_id) = self
                .vault
                .decrypt_credential_pair(record.primary_secret.as_str(), secondary)
                .await?;
            (api_key, project_id, SecretSource::Encrypted)
        } else {
            let project_id = record
                .secondary_secret
                .as_ref()
                .map(|secret| secret.as_str().to_owned());
            (
                record.primary_secret.as_str().to_owned(),
                project_id,
                SecretSource::Plaintext,
            )
        };

        Ok(Some(IntegrationCredentials {
            api_key,
            project_id,
            params,
            source,
        }))
    }

    /// Whether an integration has a stored, active credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails
    pub async fn is_configured(
        &self,
        scope: &TenantScopedDb,
        integration_name: &str,
    ) -> AppResult<bool> {
        let record = scope.get_credential(integration_name).await?;
        Ok(record.is_some_and(|record| record.is_active))
    }

    /// Encrypt and store a credential pair for one integration.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault is unconfigured, encryption fails, or
    /// the database write fails
    pub async fn store_credentials(
        &self,
        scope: &TenantScopedDb,
        integration_name: &str,
        api_key: &str,
        project_id: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> AppResult<()> {
        let (primary, secondary) = self
            .vault
            .encrypt_credential_pair(api_key, project_id)
            .await?;

        scope
            .upsert_credential(integration_name, &primary, secondary.as_deref(), metadata)
            .await?;

        info!(
            tenant_id = %scope.tenant_id(),
            integration = %integration_name,
            "Stored encrypted integration credential"
        );
        Ok(())
    }

    /// Re-encrypt every legacy plaintext secret for the tenant.
    ///
    /// One-time backfill for rows stored before encryption was introduced.
    /// Rows already in the vault wire format are left untouched. Returns the
    /// number of migrated records.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault is unconfigured or any encryption or
    /// database write fails; migration stops at the first failure
    pub async fn reencrypt_legacy_credentials(&self, scope: &TenantScopedDb) -> AppResult<usize> {
        let records = scope.list_credentials().await?;
        let mut migrated = 0usize;

        for record in records {
            let primary_is_plain = !record.primary_secret.is_encrypted();
            let secondary_is_plain = record
                .secondary_secret
                .as_ref()
                .is_some_and(|secret| !secret.is_encrypted());

            if !primary_is_plain && !secondary_is_plain {
                continue;
            }

            let primary = if primary_is_plain {
                self.vault.encrypt(record.primary_secret.as_str()).await?
            } else {
                record.primary_secret.as_str().to_owned()
            };

            let secondary = match &record.secondary_secret {
                Some(secret) if !secret.is_encrypted() => {
                    Some(self.vault.encrypt(secret.as_str()).await?)
                }
                Some(secret) => Some(secret.as_str().to_owned()),
                None => None,
            };

            scope
                .update_credential_secrets(&record.integration_name, &primary, secondary.as_deref())
                .await?;
            migrated += 1;

            info!(
                tenant_id = %scope.tenant_id(),
                integration = %record.integration_name,
                "Re-encrypted legacy credential"
            );
        }

        Ok(migrated)
    }
}

/// Derive connection parameters from stored metadata.
///
/// Precedence: an explicit `base_url` wins, then a `region` code expands to
/// a regional host, then the integration's default host.
#[must_use]
pub fn derive_connection_params(
    integration_name: &str,
    metadata: &HashMap<String, String>,
) -> ConnectionParams {
    let mode = IntegrationMode::from_metadata(metadata.get(metadata_keys::MODE).map(String::as_str));

    let base_url = match metadata.get(metadata_keys::BASE_URL).map(String::as_str) {
        Some(url) if url.starts_with("https://") => url.trim_end_matches('/').to_owned(),
        Some(url) if !url.is_empty() => {
            warn!(
                integration = %integration_name,
                "Ignoring non-https base_url in credential metadata"
            );
            host_from_region(integration_name, metadata)
        }
        _ => host_from_region(integration_name, metadata),
    };

    ConnectionParams { base_url, mode }
}

fn host_from_region(integration_name: &str, metadata: &HashMap<String, String>) -> String {
    match metadata.get(metadata_keys::REGION).map(String::as_str) {
        Some(region) if !region.is_empty() => {
            format!("https://{region}.api.{integration_name}.com")
        }
        _ => format!("https://api.{integration_name}.com"),
    }
}
