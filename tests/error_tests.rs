// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use planner_dashboard::error::AppError;

async fn render(err: AppError) -> (StatusCode, String) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, body["error"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_status_mapping() {
    assert_eq!(
        render(AppError::Unauthorized).await,
        (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
    );
    assert_eq!(
        render(AppError::Auth(AppError::SESSION_EXPIRED.to_string())).await,
        (
            StatusCode::UNAUTHORIZED,
            "Session expired, please sign in again".to_string()
        )
    );
    assert_eq!(
        render(AppError::BadRequest("userId is required".to_string())).await,
        (StatusCode::BAD_REQUEST, "userId is required".to_string())
    );
    assert_eq!(
        render(AppError::NotFound("workbook /x".to_string())).await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_upstream_error_keeps_message() {
    let err = AppError::Upstream {
        status: 403,
        message: "Insufficient privileges".to_string(),
    };
    assert_eq!(err.upstream_status(), Some(403));

    let (status, message) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message,
        "Graph API request failed (403): Insufficient privileges"
    );
}

#[tokio::test]
async fn test_summary_error_names_its_source() {
    let err = AppError::Summary {
        status: 503,
        message: "Service Unavailable".to_string(),
    };
    assert_eq!(err.upstream_status(), None);

    let (status, message) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message,
        "Event summary request failed (503): Service Unavailable"
    );
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let err = AppError::Internal(anyhow::anyhow!("db password is hunter2"));
    assert_eq!(err.upstream_status(), None);

    let (status, message) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "Internal server error");
}
