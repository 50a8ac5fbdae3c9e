// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job trigger authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer {JOB_TOKEN}` on job routes.
///
/// With no job token configured the routes stay open, so an external
/// scheduler without credentials can still trigger them.
pub async fn require_job_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.job_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .unwrap_or("");

    let matches: bool = presented.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        tracing::warn!(
            path = %request.uri().path(),
            "Blocked job request with invalid token"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
