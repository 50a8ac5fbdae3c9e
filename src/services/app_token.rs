// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service-level (application) token provider.
//!
//! Tokens from the client-credentials grant are cached in memory until
//! shortly before they expire. A single lock serializes grants so a burst
//! of requests after expiry results in one call to the identity provider.

use crate::error::AppError;
use crate::services::IdentityClient;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Cached access token with expiry information.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Process-wide cache of the application token.
#[derive(Clone)]
pub struct AppTokenProvider {
    identity: IdentityClient,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl AppTokenProvider {
    pub fn new(identity: IdentityClient) -> Self {
        Self {
            identity,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Get a valid application access token, requesting a new one if needed.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cache.lock().await;
        let now = Utc::now();
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        if let Some(token) = cached.as_ref() {
            if now + margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self.identity.client_credentials().await?;
        let expires_at = now + Duration::seconds(response.expires_in);

        tracing::debug!(expires_at = %expires_at, "Application token acquired");

        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });

        Ok(response.access_token)
    }

    /// Drop the cached token (next call requests a new one).
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    /// Forget the cached token if Graph answered 401 to it.
    pub async fn invalidate_if_rejected(&self, err: &AppError) {
        if err.upstream_status() == Some(401) {
            tracing::warn!("Graph rejected the application token, dropping it");
            self.invalidate().await;
        }
    }
}
