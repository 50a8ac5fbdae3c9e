// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Microsoft identity platform client.
//!
//! Handles:
//! - Authorization URL construction for the delegated sign-in flow
//! - Authorization code exchange
//! - Refresh-token grants for signed-in users
//! - Client-credentials grants for the service itself

use crate::config::Config;
use crate::error::AppError;
use crate::models::Credential;
use serde::Deserialize;

/// Delegated scopes requested at sign-in.
pub const DELEGATED_SCOPES: &str =
    "openid profile email offline_access User.Read.All Tasks.Read Group.Read.All";

/// Token endpoint client for one tenant and app registration.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    token_endpoint: String,
    authorize_endpoint: String,
    client_id: String,
    client_secret: String,
    /// `{graph}/.default`, used for client-credentials grants
    app_scope: String,
    redirect_uri: String,
}

impl IdentityClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            token_endpoint: config.token_endpoint(),
            authorize_endpoint: config.authorize_endpoint(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            app_scope: format!(
                "{}/.default",
                config.graph_api_endpoint.trim_end_matches('/')
            ),
            redirect_uri: config.callback_url(),
        }
    }

    /// Authorization URL the browser is redirected to on sign-in.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&response_mode=query&scope={}&state={}",
            self.authorize_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(DELEGATED_SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for the user's tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("scope", DELEGATED_SCOPES),
        ])
        .await
    }

    /// Refresh a delegated access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Obtain a service (application) token.
    pub async fn client_credentials(&self) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.app_scope.as_str()),
            ("grant_type", "client_credentials"),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let grant = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, grant, body = %body, "Token endpoint rejected grant");
            return Err(AppError::Auth(format!(
                "Token request failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(AppError::Auth(
                "Token response missing access_token".to_string(),
            ));
        }

        Ok(token)
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,
}

impl TokenResponse {
    /// Credential expiring `expires_in` seconds after `now_ms`.
    ///
    /// A missing refresh token keeps `previous_refresh` (providers may
    /// omit it on refresh).
    pub fn into_credential(self, now_ms: i64, previous_refresh: Option<String>) -> Credential {
        Credential::new(
            self.access_token,
            self.refresh_token.or(previous_refresh),
            now_ms + self.expires_in * 1000,
        )
    }
}
