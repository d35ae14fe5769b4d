// ABOUTME: Tenant and membership database operations
// ABOUTME: Backs workspace resolution and role lookup through the tenant_users junction table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, TenantMembership, TenantRole};

impl Database {
    /// Create a tenant workspace and its owner membership atomically
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The slug is already in use
    /// - Database operation fails
    pub async fn create_tenant(&self, tenant: &Tenant) -> AppResult<Uuid> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO tenants (id, name, slug, owner_user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(tenant.owner_user_id.to_string())
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create tenant: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO tenant_users (tenant_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(tenant.id.to_string())
        .bind(tenant.owner_user_id.to_string())
        .bind(TenantRole::Owner.as_db_string())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create owner membership: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit tenant creation: {e}")))?;

        Ok(tenant.id)
    }

    /// Get a tenant by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_tenant_by_id(&self, tenant_id: Uuid) -> AppResult<Option<Tenant>> {
        let row = sqlx::query(
            r"
            SELECT id, name, slug, owner_user_id, created_at, updated_at
            FROM tenants
            WHERE id = $1
            ",
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query tenant: {e}")))?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(row_to_tenant(&row)?)))
    }

    /// Add or update a tenant membership
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn add_tenant_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO tenant_users (tenant_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, user_id) DO UPDATE SET
                role = EXCLUDED.role
            ",
        )
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(role.as_db_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add tenant member: {e}")))?;

        Ok(())
    }

    /// Get a user's role in a tenant from the `tenant_users` junction table
    ///
    /// This is the source of truth for multi-tenant membership. Returns
    /// `None` when no membership row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_tenant_role(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> AppResult<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT role FROM tenant_users
            WHERE user_id = $1 AND tenant_id = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query tenant role: {e}")))?;

        Ok(row.map(|r| r.get("role")))
    }

    /// Get a user's default tenant membership, oldest `joined_at` first
    ///
    /// Reads the `tenant_users` junction table alone, so membership
    /// resolution does not depend on the tenant row itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_default_tenant_membership(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TenantMembership>> {
        let row = sqlx::query(
            r"
            SELECT tenant_id, role FROM tenant_users
            WHERE user_id = $1
            ORDER BY joined_at ASC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query tenant membership: {e}")))?;

        row.map_or_else(
            || Ok(None),
            |row| {
                let tenant_id_str: String = row.get("tenant_id");
                let role_str: String = row.get("role");
                Ok(Some(TenantMembership {
                    tenant_id: Uuid::parse_str(&tenant_id_str)?,
                    role: TenantRole::from_db_string(&role_str),
                }))
            },
        )
    }

    /// List the tenants a user belongs to, oldest membership first
    ///
    /// The first entry is the user's default tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_tenants_for_user(&self, user_id: Uuid) -> AppResult<Vec<Tenant>> {
        let rows = sqlx::query(
            r"
            SELECT t.id, t.name, t.slug, t.owner_user_id, t.created_at, t.updated_at
            FROM tenants t
            INNER JOIN tenant_users tu ON tu.tenant_id = t.id
            WHERE tu.user_id = $1
            ORDER BY tu.joined_at ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query user tenants: {e}")))?;

        let mut tenants = Vec::with_capacity(rows.len());
        for row in rows {
            tenants.push(row_to_tenant(&row)?);
        }
        Ok(tenants)
    }
}

fn row_to_tenant(row: &SqliteRow) -> AppResult<Tenant> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)?;
    let owner_str: String = row.get("owner_user_id");
    let owner_user_id = Uuid::parse_str(&owner_str)?;

    Ok(Tenant {
        id,
        name: row.get("name"),
        slug: row.get("slug"),
        owner_user_id,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
