// ABOUTME: Per-tenant rate limiting for credential write operations
// ABOUTME: Fixed-window counters produce the limit/remaining/reset info rendered as 429 headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vaultguard Contributors

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Rate limit window state for a single tenant
///
/// Rendered into the `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
/// `X-RateLimit-Reset` response headers when a write is rejected.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitInfo {
    /// Whether the request was rejected by the limiter
    pub is_rate_limited: bool,
    /// Maximum requests allowed in the current window
    pub limit: u32,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

struct WindowState {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window write counter keyed by tenant
///
/// Credential writes are low-volume administrative operations; an
/// in-process window per tenant is sufficient and keeps the write path
/// free of external round-trips.
pub struct CredentialWriteLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<Uuid, WindowState>>,
}

impl CredentialWriteLimiter {
    /// Create a limiter allowing `limit` writes per tenant per `window_secs` seconds
    #[must_use]
    pub fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            limit,
            window: Duration::seconds(window_secs),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one write attempt for `tenant_id` against the current window
    ///
    /// When the returned info has `is_rate_limited` set the attempt was
    /// rejected and the counter is unchanged.
    pub fn check(&self, tenant_id: Uuid) -> RateLimitInfo {
        let now = Utc::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = windows.entry(tenant_id).or_insert_with(|| WindowState {
            started_at: now,
            count: 0,
        });

        if now - state.started_at >= self.window {
            state.started_at = now;
            state.count = 0;
        }
        let reset_at = state.started_at + self.window;

        if state.count >= self.limit {
            return RateLimitInfo {
                is_rate_limited: true,
                limit: self.limit,
                remaining: 0,
                reset_at,
            };
        }

        state.count += 1;
        RateLimitInfo {
            is_rate_limited: false,
            limit: self.limit,
            remaining: self.limit - state.count,
            reset_at,
        }
    }
}
