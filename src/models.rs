// ABOUTME: Core domain models for users, tenants, memberships, and credential records
// ABOUTME: Persisted entity types plus the tagged secret classification used by the pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::SecretVault;

/// Registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Login email, unique across the system
    pub email: String,
    /// Bcrypt password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// Tenant workspace owning credentials and memberships
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant identifier
    pub id: Uuid,
    /// Human-readable workspace name
    pub name: String,
    /// URL-safe unique workspace slug
    pub slug: String,
    /// User who owns the workspace
    pub owner_user_id: Uuid,
    /// When the workspace was created
    pub created_at: DateTime<Utc>,
    /// When the workspace was last modified
    pub updated_at: DateTime<Utc>,
}

/// Role a user holds within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    /// Full control including credential administration
    Owner,
    /// Regular workspace member
    Member,
}

impl TenantRole {
    /// Database string form
    #[must_use]
    pub const fn as_db_string(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }

    /// Parse from the database string form; unknown values become `Member`
    #[must_use]
    pub fn from_db_string(value: &str) -> Self {
        match value {
            "owner" => Self::Owner,
            _ => Self::Member,
        }
    }
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_string())
    }
}

/// A user's membership row in the `tenant_users` junction table
#[derive(Debug, Clone, Copy)]
pub struct TenantMembership {
    /// Tenant the membership points at
    pub tenant_id: Uuid,
    /// Role held in that tenant
    pub role: TenantRole,
}

/// Lifecycle status of an integration credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Validated and usable
    Connected,
    /// Deactivated by an operator
    Disconnected,
    /// Last validation attempt failed
    Error,
    /// Stored but not yet validated
    Validating,
}

impl CredentialStatus {
    /// Database string form
    #[must_use]
    pub const fn as_db_string(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::Validating => "validating",
        }
    }

    /// Parse from the database string form; unknown values become `Error`
    #[must_use]
    pub fn from_db_string(value: &str) -> Self {
        match value {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            "validating" => Self::Validating,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_string())
    }
}

/// Stored secret value tagged by storage form
///
/// Rows written before vault rollout hold plaintext; everything written
/// since holds the vault wire format. Classification happens once at read
/// time so downstream code branches on the tag, never on re-inspection.
#[derive(Clone, PartialEq, Eq)]
pub enum StoredSecret {
    /// Pre-vault plaintext value (legacy migration path)
    Plaintext(String),
    /// Vault wire-format value (`salt:iv:tag:ciphertext` hex)
    Encrypted(String),
}

impl StoredSecret {
    /// Classify a stored column value by wire-format inspection
    #[must_use]
    pub fn classify(value: String) -> Self {
        if SecretVault::is_encrypted(&value) {
            Self::Encrypted(value)
        } else {
            Self::Plaintext(value)
        }
    }

    /// The raw stored value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plaintext(value) | Self::Encrypted(value) => value,
        }
    }

    /// Whether the value is in the vault wire format
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext(_) => f.write_str("StoredSecret::Plaintext(<redacted>)"),
            Self::Encrypted(_) => f.write_str("StoredSecret::Encrypted(<redacted>)"),
        }
    }
}

/// Persisted integration credential row for one (tenant, integration) pair
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// Unique row identifier
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Integration this credential authenticates against
    pub integration_name: String,
    /// Primary secret (API key or token), classified at read time
    pub primary_secret: StoredSecret,
    /// Optional secondary secret (project or account identifier)
    pub secondary_secret: Option<StoredSecret>,
    /// Connection metadata: region, base_url, mode
    pub metadata: HashMap<String, String>,
    /// Whether the integration is activated for use
    pub is_active: bool,
    /// Lifecycle status
    pub status: CredentialStatus,
    /// When the row was created
    pub created_at: DateTime<Utc>,
    /// When the row was last modified
    pub updated_at: DateTime<Utc>,
}
