// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer credential with expiry tracking.

use crate::error::AppError;

/// Marker set on a credential whose refresh failed.
pub const REFRESH_ACCESS_TOKEN_ERROR: &str = "RefreshAccessTokenError";

/// Access token plus the data needed to keep it valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiry as Unix epoch milliseconds
    pub expires_at: i64,
    /// Set to [`REFRESH_ACCESS_TOKEN_ERROR`] after a failed refresh
    pub error: Option<String>,
}

impl Credential {
    pub fn new(access_token: String, refresh_token: Option<String>, expires_at: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            error: None,
        }
    }

    /// Valid while `now < expires_at`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn has_refresh_error(&self) -> bool {
        self.error.is_some()
    }

    /// Copy of this credential carrying the refresh error marker.
    /// Token fields are kept as they were.
    pub fn with_refresh_error(&self) -> Self {
        Self {
            error: Some(REFRESH_ACCESS_TOKEN_ERROR.to_string()),
            ..self.clone()
        }
    }

    /// The access token, if it may be trusted.
    pub fn bearer(&self) -> Result<&str, AppError> {
        if self.has_refresh_error() {
            return Err(AppError::Auth(AppError::SESSION_EXPIRED.to_string()));
        }
        if self.access_token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(&self.access_token)
    }
}
