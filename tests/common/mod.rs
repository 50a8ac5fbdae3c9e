// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use planner_dashboard::config::Config;
use planner_dashboard::middleware::auth::{create_jwt, SESSION_COOKIE};
use planner_dashboard::models::Credential;
use planner_dashboard::routes::create_router;
use planner_dashboard::services::Session;
use planner_dashboard::time_utils::now_millis;
use planner_dashboard::AppState;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token endpoint path for the test tenant.
#[allow(dead_code)]
pub const TOKEN_PATH: &str = "/test-tenant/oauth2/v2.0/token";

/// Test configuration with identity provider and Graph served by `server`.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::test_default();
    config.login_base_url = server.uri();
    config.graph_api_endpoint = server.uri();
    config.digest_summary_url = format!("{}/api/events/summary", server.uri());
    config
}

/// Create a test app from a config.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Create a test app talking to `server`.
#[allow(dead_code)]
pub fn create_test_app(server: &MockServer) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(test_config(server))
}

/// Create a session directly and return the matching `Cookie` header value.
#[allow(dead_code)]
pub fn sign_in(state: &AppState, email: &str, credential: Credential) -> String {
    let session_id = state
        .sessions
        .create(Session {
            email: email.to_string(),
            name: "Test User".to_string(),
            credential,
        })
        .unwrap();

    let jwt = create_jwt(&session_id, email, "Test User", &state.config.session_secret).unwrap();
    format!("{}={}", SESSION_COOKIE, jwt)
}

/// A credential valid for the next hour.
#[allow(dead_code)]
pub fn fresh_credential(access_token: &str) -> Credential {
    Credential::new(
        access_token.to_string(),
        Some("refresh-token".to_string()),
        now_millis() + 3_600_000,
    )
}

/// A credential that expired a minute ago.
#[allow(dead_code)]
pub fn expired_credential(access_token: &str) -> Credential {
    Credential::new(
        access_token.to_string(),
        Some("refresh-token".to_string()),
        now_millis() - 60_000,
    )
}

/// Serve client-credentials grants with `app-token`.
#[allow(dead_code)]
pub async fn mount_app_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "app-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
