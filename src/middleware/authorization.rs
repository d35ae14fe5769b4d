// ABOUTME: Tenant authorization middleware guarding every protected route
// ABOUTME: Runs authenticate, resolve-tenant, and establish-scope in fixed order before any handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use crate::auth::{extract_bearer_token, AuthManager};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::TenantMembership;
use crate::tenant::{AuthorizationContext, TenantScopedDb};
use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use http::request::Parts;
use http::HeaderMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::field::{display, Empty};
use tracing::{debug, error, warn, Span};
use uuid::Uuid;

/// One stage of the per-request authorization chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStage {
    /// Resolve the caller's identity from the bearer token
    Authenticate,
    /// Resolve the caller's tenant membership and role
    ResolveTenant,
    /// Confirm the tenant scope against the database
    EstablishScope,
}

impl AuthorizationStage {
    /// Stage name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::ResolveTenant => "resolve-tenant",
            Self::EstablishScope => "establish-scope",
        }
    }
}

/// The fixed stage order applied to every protected request.
///
/// The order itself is the contract: no handler runs unless every stage in
/// this array has succeeded, in sequence, within the same request.
pub const AUTHORIZATION_CHAIN: [AuthorizationStage; 3] = [
    AuthorizationStage::Authenticate,
    AuthorizationStage::ResolveTenant,
    AuthorizationStage::EstablishScope,
];

/// Runs the authorization chain for protected requests.
///
/// Dependencies are injected at construction; a fresh
/// [`AuthorizationContext`] is produced per request and never cached.
pub struct RequestAuthorizer {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl RequestAuthorizer {
    /// Create an authorizer over the shared auth manager and database.
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Run every stage of [`AUTHORIZATION_CHAIN`] in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure: an unauthenticated error when no
    /// valid identity is presented, a workspace error when the user belongs
    /// to no tenant, or a scope failure when the tenant scope cannot be
    /// confirmed against the database
    #[tracing::instrument(skip_all, fields(user_id = Empty, tenant_id = Empty))]
    pub async fn authorize(&self, headers: &HeaderMap) -> AppResult<AuthorizationContext> {
        let mut identity: Option<Uuid> = None;
        let mut membership: Option<TenantMembership> = None;
        let mut context: Option<AuthorizationContext> = None;

        for stage in AUTHORIZATION_CHAIN {
            match stage {
                AuthorizationStage::Authenticate => {
                    let user_id = self.authenticate(headers).await?;
                    Span::current().record("user_id", display(user_id));
                    identity = Some(user_id);
                }
                AuthorizationStage::ResolveTenant => {
                    let user_id = identity.ok_or_else(|| {
                        AppError::internal("Authorization chain ran resolve-tenant before authenticate")
                    })?;
                    let resolved = self.resolve_tenant(user_id).await?;
                    Span::current().record("tenant_id", display(resolved.tenant_id));
                    membership = Some(resolved);
                }
                AuthorizationStage::EstablishScope => {
                    let user_id = identity.ok_or_else(|| {
                        AppError::internal("Authorization chain ran establish-scope before authenticate")
                    })?;
                    let resolved = membership.take().ok_or_else(|| {
                        AppError::internal("Authorization chain ran establish-scope before resolve-tenant")
                    })?;
                    context = Some(self.establish_scope(user_id, resolved).await?);
                }
            }
            debug!(stage = stage.as_str(), "Authorization stage passed");
        }

        context.ok_or_else(|| AppError::internal("Authorization chain finished without a context"))
    }

    /// Stage 1: resolve the caller's identity from the bearer token.
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Uuid> {
        let token = extract_bearer_token(headers)?;
        let claims = self.auth_manager.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
            AppError::unauthenticated(format!("Token subject is not a valid user ID: {e}"))
        })?;

        let user = self
            .database
            .get_user(user_id)
            .await
            .map_err(|e| {
                warn!(user_id = %user_id, error = %e, "Identity lookup failed");
                AppError::unauthenticated("Identity could not be resolved")
            })?
            .ok_or_else(|| AppError::unauthenticated("Unknown user"))?;

        if !user.is_active {
            return Err(AppError::unauthenticated("User account is deactivated"));
        }

        Ok(user.id)
    }

    /// Stage 2: resolve the user's tenant membership and role.
    ///
    /// The `tenant_users` junction table is the source of truth for
    /// membership; the user's oldest membership is the default tenant.
    async fn resolve_tenant(&self, user_id: Uuid) -> AppResult<TenantMembership> {
        self.database
            .get_default_tenant_membership(user_id)
            .await?
            .ok_or_else(|| {
                AppError::no_workspace(format!("User {user_id} does not belong to any tenant"))
            })
    }

    /// Stage 3: confirm the tenant scope and build the request context.
    ///
    /// The scope confirmation must round-trip to the database before any
    /// handler code runs; a failure here is terminal for the request.
    async fn establish_scope(
        &self,
        user_id: Uuid,
        membership: TenantMembership,
    ) -> AppResult<AuthorizationContext> {
        self.database
            .establish_tenant_scope(membership.tenant_id)
            .await?;

        let tenant_name = match self.database.get_tenant_by_id(membership.tenant_id).await {
            Ok(Some(tenant)) => tenant.name,
            Ok(None) => {
                warn!(tenant_id = %membership.tenant_id, "Tenant row missing, using default name");
                "Unknown Tenant".to_owned()
            }
            Err(e) => {
                warn!(tenant_id = %membership.tenant_id, error = %e, "Failed to load tenant name, using default name");
                "Unknown Tenant".to_owned()
            }
        };

        Ok(AuthorizationContext {
            tenant_id: membership.tenant_id,
            tenant_name,
            user_id,
            role: membership.role,
            db: TenantScopedDb::new(membership.tenant_id, Arc::clone(&self.database)),
        })
    }
}

/// Axum middleware wrapping every protected route.
///
/// On chain failure the classified error is rendered and the handler is
/// never invoked. A handler panic is caught once here and rendered as the
/// generic unknown-error response.
pub async fn tenant_authorization_middleware(
    State(authorizer): State<Arc<RequestAuthorizer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match authorizer.authorize(request.headers()).await {
        Ok(context) => context,
        Err(error) => return error.into_response(),
    };

    let tenant_id = context.tenant_id;
    request.extensions_mut().insert(context);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_panic) => {
            error!(tenant_id = %tenant_id, "Request handler panicked");
            AppError::unknown().into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizationContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::internal("Route handler ran without the tenant authorization middleware")
        })
    }
}
