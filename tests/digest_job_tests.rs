// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job route tests: digest email (`/api/email`), job token, service token reuse.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as header_eq, method, path, path_regex, PathRegexMatcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn email_request() -> Request<Body> {
    Request::builder()
        .uri("/api/email")
        .body(Body::empty())
        .unwrap()
}

async fn mount_summary(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/events/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event": "Spring Gala", "eta": "2026-11-01", "capacity": 200, "sold": 180, "percentage": 90.0 },
            { "event": "Poetry <Night>", "eta": "2026-11-03", "capacity": 50, "sold": 5, "percentage": 10.0 }
        ])))
        .mount(server)
        .await;
}

fn recipients(config: &mut planner_dashboard::config::Config, list: &[&str]) {
    config.digest_recipients = list.iter().map(|r| r.to_string()).collect();
}

#[tokio::test]
async fn test_digest_sends_to_every_recipient() {
    let server = MockServer::start().await;
    common::mount_app_token(&server).await;
    mount_summary(&server).await;

    Mock::given(method("POST"))
        .and(path_for_sender())
        .and(header_eq("authorization", "Bearer app-token"))
        .and(body_string_contains("Daily Event Summary"))
        .and(body_string_contains("Poetry &lt;Night&gt;"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = common::test_config(&server);
    recipients(&mut config, &["a@example.com", "b@example.com"]);
    let (app, _) = common::create_test_app_with_config(config);

    let response = app.oneshot(email_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "Email sent.");
    assert_eq!(body["succeeded"], json!(["a@example.com", "b@example.com"]));
    assert_eq!(body["failed"], json!([]));
}

#[tokio::test]
async fn test_one_failed_recipient_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    common::mount_app_token(&server).await;
    mount_summary(&server).await;

    Mock::given(method("POST"))
        .and(path_for_sender())
        .and(body_string_contains("b@example.com"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "ErrorInvalidRecipients", "message": "Invalid recipient" }
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_for_sender())
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = common::test_config(&server);
    recipients(
        &mut config,
        &["a@example.com", "b@example.com", "c@example.com"],
    );
    let (app, _) = common::create_test_app_with_config(config);

    let response = app.oneshot(email_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["succeeded"], json!(["a@example.com", "c@example.com"]));

    let failed = body["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["item"], "b@example.com");
    assert!(failed[0]["error"]
        .as_str()
        .unwrap()
        .contains("Invalid recipient"));
}

#[tokio::test]
async fn test_summary_failure_sends_nothing() {
    let server = MockServer::start().await;
    common::mount_app_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/events/summary"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_for_sender())
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = common::create_test_app(&server);
    let response = app.oneshot(email_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with("Event summary request failed (502)"),
        "unexpected error: {error}"
    );
    assert!(!error.contains("Graph"));
}

#[tokio::test]
async fn test_service_token_failure_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let (app, _) = common::create_test_app(&server);
    let response = app.oneshot(email_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_token_required_when_configured() {
    let server = MockServer::start().await;
    let mut config = common::test_config(&server);
    config.job_token = Some("s3cret".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = app.clone().oneshot(email_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tasks/download")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_token_accepted() {
    let server = MockServer::start().await;
    common::mount_app_token(&server).await;
    mount_summary(&server).await;
    Mock::given(method("POST"))
        .and(path_for_sender())
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = common::test_config(&server);
    config.job_token = Some("s3cret".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/email")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// `sendMail` for the configured sender, with or without the `@` encoded.
fn path_for_sender() -> PathRegexMatcher {
    path_regex(r"^/v1\.0/users/digest(@|%40)example\.com/sendMail$")
}

#[tokio::test]
async fn test_rejected_service_token_is_dropped() {
    let server = MockServer::start().await;

    // One grant per run: the 401 below must evict the cached token.
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/workbook/createSession$"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "InvalidAuthenticationToken", "message": "Token revoked" }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = common::test_config(&server);
    config.export_recipients = Vec::new();
    let (app, _) = common::create_test_app_with_config(config);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/tasks/download")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
