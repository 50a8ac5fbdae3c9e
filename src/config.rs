// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Identity provider credentials and
//! the session signing secret are required; job settings are optional and
//! the corresponding job reports an error when run without them.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Identity provider ---
    /// Azure AD tenant ID
    pub tenant_id: String,
    /// Azure AD application (client) ID
    pub client_id: String,
    /// Azure AD client secret
    pub client_secret: String,
    /// Token endpoint host, without tenant path
    pub login_base_url: String,

    // --- Graph ---
    /// Graph resource root (also the client-credentials scope prefix)
    pub graph_api_endpoint: String,

    // --- Server ---
    /// Public URL of this service, used for the OAuth callback and cookies
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// HS256 key for session cookies and OAuth state (raw bytes)
    pub session_secret: Vec<u8>,

    // --- Jobs ---
    /// Mailbox the digest is sent from
    pub mail_sender: String,
    /// Pre-aggregated event summary endpoint
    pub digest_summary_url: String,
    pub digest_recipients: Vec<String>,
    pub export_recipients: Vec<String>,
    /// Graph path of the export workbook drive item, e.g. `/users/{id}/drive/items/{item}`
    pub export_workbook_path: String,
    /// Bearer token required on job routes when set
    pub job_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            tenant_id: required("AZURE_AD_TENANT_ID")?,
            client_id: required("AZURE_AD_CLIENT_ID")?,
            client_secret: required("AZURE_AD_CLIENT_SECRET")?,
            login_base_url: optional("LOGIN_BASE_URL", "https://login.microsoftonline.com"),
            graph_api_endpoint: optional("GRAPH_API_ENDPOINT", "https://graph.microsoft.com"),
            public_url: optional("PUBLIC_URL", "http://localhost:8080"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_secret: required("SESSION_SECRET")?.into_bytes(),
            mail_sender: optional("MAIL_SENDER", ""),
            digest_summary_url: optional("DIGEST_SUMMARY_URL", ""),
            digest_recipients: parse_list(&optional("DIGEST_RECIPIENTS", "")),
            export_recipients: parse_list(&optional("EXPORT_RECIPIENTS", "")),
            export_workbook_path: optional("EXPORT_WORKBOOK_PATH", ""),
            job_token: env::var("JOB_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            tenant_id: "test-tenant".to_string(),
            client_id: "test_client_id".to_string(),
            client_secret: "test_secret".to_string(),
            login_base_url: "http://localhost:9999".to_string(),
            graph_api_endpoint: "http://localhost:9998".to_string(),
            public_url: "http://localhost:8080".to_string(),
            port: 8080,
            session_secret: b"test_session_key_32_bytes_min!!".to_vec(),
            mail_sender: "digest@example.com".to_string(),
            digest_summary_url: "http://localhost:9997/api/events/summary".to_string(),
            digest_recipients: vec!["a@example.com".to_string()],
            export_recipients: vec!["a@example.com".to_string()],
            export_workbook_path: "/users/owner/drive/items/ITEM".to_string(),
            job_token: None,
        }
    }

    /// Graph REST base, e.g. `https://graph.microsoft.com/v1.0`.
    pub fn graph_base_url(&self) -> String {
        format!("{}/v1.0", self.graph_api_endpoint.trim_end_matches('/'))
    }

    /// OAuth2 v2.0 token endpoint for the configured tenant.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// OAuth2 v2.0 authorize endpoint for the configured tenant.
    pub fn authorize_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.login_base_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.public_url.trim_end_matches('/'))
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_https(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
