// ABOUTME: Integration credential database operations for per-tenant secret storage
// ABOUTME: Stores already-encrypted secret values; the vault never lives at this layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use std::collections::HashMap;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{CredentialRecord, CredentialStatus, StoredSecret};

/// Credential data for an upsert operation
///
/// Secret values arrive here already in their storage form; encryption is
/// the credential pipeline's responsibility.
pub struct CredentialData<'a> {
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Integration this credential authenticates against
    pub integration_name: &'a str,
    /// Primary secret in storage form
    pub primary_secret: &'a str,
    /// Optional secondary secret in storage form
    pub secondary_secret: Option<&'a str>,
    /// Connection metadata: region, base_url, mode
    pub metadata: &'a HashMap<String, String>,
}

impl Database {
    /// Upsert an integration credential
    ///
    /// A replaced secret resets the lifecycle status to `validating`; the
    /// activation flag and original row id are preserved on update.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata serialization or the database
    /// operation fails
    pub async fn upsert_integration_credential(
        &self,
        data: &CredentialData<'_>,
    ) -> AppResult<()> {
        let metadata_json = serde_json::to_string(data.metadata)
            .map_err(|e| AppError::internal(format!("Failed to serialize metadata: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO integration_credentials (
                id, tenant_id, integration_name, primary_secret, secondary_secret,
                metadata, is_active, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tenant_id, integration_name)
            DO UPDATE SET
                primary_secret = EXCLUDED.primary_secret,
                secondary_secret = EXCLUDED.secondary_secret,
                metadata = EXCLUDED.metadata,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(data.tenant_id.to_string())
        .bind(data.integration_name)
        .bind(data.primary_secret)
        .bind(data.secondary_secret)
        .bind(&metadata_json)
        .bind(true)
        .bind(CredentialStatus::Validating.as_db_string())
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert credential: {e}")))?;

        Ok(())
    }

    /// Get the credential row for a (tenant, integration) pair
    ///
    /// A missing row is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_integration_credential(
        &self,
        tenant_id: Uuid,
        integration_name: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, tenant_id, integration_name, primary_secret, secondary_secret,
                   metadata, is_active, status, created_at, updated_at
            FROM integration_credentials
            WHERE tenant_id = $1 AND integration_name = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(integration_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query credential: {e}")))?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(row_to_credential_record(&row)?)))
    }

    /// List all credential rows for a tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_integration_credentials(
        &self,
        tenant_id: Uuid,
    ) -> AppResult<Vec<CredentialRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, tenant_id, integration_name, primary_secret, secondary_secret,
                   metadata, is_active, status, created_at, updated_at
            FROM integration_credentials
            WHERE tenant_id = $1
            ORDER BY integration_name ASC
            ",
        )
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query credentials: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(row_to_credential_record(&row)?);
        }
        Ok(records)
    }

    /// Update the lifecycle status of a credential
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the query fails
    pub async fn update_credential_status(
        &self,
        tenant_id: Uuid,
        integration_name: &str,
        status: CredentialStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE integration_credentials
            SET status = $3, updated_at = $4
            WHERE tenant_id = $1 AND integration_name = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(integration_name)
        .bind(status.as_db_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update credential status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Credential for integration {integration_name}"
            )));
        }
        Ok(())
    }

    /// Toggle the activation flag of a credential
    ///
    /// Rows are never hard-deleted; deactivation flips this flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the query fails
    pub async fn set_credential_active(
        &self,
        tenant_id: Uuid,
        integration_name: &str,
        is_active: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE integration_credentials
            SET is_active = $3, updated_at = $4
            WHERE tenant_id = $1 AND integration_name = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(integration_name)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update activation flag: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Credential for integration {integration_name}"
            )));
        }
        Ok(())
    }

    /// Rewrite the stored secret values of an existing credential row
    ///
    /// Used by the legacy re-encryption backfill; touches only the secret
    /// columns and the update timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or the query fails
    pub async fn update_credential_secrets(
        &self,
        tenant_id: Uuid,
        integration_name: &str,
        primary_secret: &str,
        secondary_secret: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE integration_credentials
            SET primary_secret = $3, secondary_secret = $4, updated_at = $5
            WHERE tenant_id = $1 AND integration_name = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(integration_name)
        .bind(primary_secret)
        .bind(secondary_secret)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update credential secrets: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Credential for integration {integration_name}"
            )));
        }
        Ok(())
    }
}

fn row_to_credential_record(row: &SqliteRow) -> AppResult<CredentialRecord> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)?;
    let tenant_id_str: String = row.get("tenant_id");
    let tenant_id = Uuid::parse_str(&tenant_id_str)?;

    let metadata_json: String = row.get("metadata");
    let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)
        .map_err(|e| AppError::internal(format!("Failed to parse credential metadata: {e}")))?;

    let primary_raw: String = row.get("primary_secret");
    let secondary_raw: Option<String> = row.get("secondary_secret");
    let status_str: String = row.get("status");

    Ok(CredentialRecord {
        id,
        tenant_id,
        integration_name: row.get("integration_name"),
        primary_secret: StoredSecret::classify(primary_raw),
        secondary_secret: secondary_raw.map(StoredSecret::classify),
        metadata,
        is_active: row.get("is_active"),
        status: CredentialStatus::from_db_string(&status_str),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
