// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No session, or the request carried no usable credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// Token acquisition or refresh with the identity provider failed.
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    BadRequest(String),

    /// Non-2xx from Graph (tasks, people, mail or workbook).
    #[error("Graph API request failed ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Non-2xx or unreachable event summary endpoint.
    #[error("Event summary request failed ({status}): {message}")]
    Summary { status: u16, message: String },

    /// A required entity (workbook, worksheet, ...) does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const SESSION_EXPIRED: &'static str = "Session expired, please sign in again";

    /// Status code reported by Graph, if this is an upstream error.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream {
            status: err.status().map(|s| s.as_u16()).unwrap_or(502),
            message: err.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream { status, message } => {
                tracing::error!(status, error = %message, "Graph API error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Summary { status, message } => {
                tracing::error!(status, error = %message, "Event summary error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
