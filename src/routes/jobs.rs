// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled job endpoints (digest email, task export).
//!
//! These are hit by an external scheduler, not by browsers, so they sit
//! behind the job token instead of a session.

use crate::error::Result;
use crate::models::JobFailure;
use crate::services::ExportResult;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/email", get(send_digest))
        .route("/api/tasks/download", get(export_tasks))
}

#[derive(Serialize)]
pub struct DigestResponse {
    pub status: &'static str,
    pub succeeded: Vec<String>,
    pub failed: Vec<JobFailure>,
}

async fn send_digest(State(state): State<Arc<AppState>>) -> Result<Json<DigestResponse>> {
    tracing::info!("Digest job triggered");
    let summary = match state.digest.run().await {
        Ok(summary) => summary,
        Err(e) => {
            state.app_tokens.invalidate_if_rejected(&e).await;
            return Err(e);
        }
    };

    if !summary.is_complete_success() {
        tracing::warn!(
            failed = summary.failed.len(),
            succeeded = summary.succeeded.len(),
            "Digest job finished with failures"
        );
    }

    Ok(Json(DigestResponse {
        status: "Email sent.",
        succeeded: summary.succeeded,
        failed: summary.failed,
    }))
}

async fn export_tasks(State(state): State<Arc<AppState>>) -> Result<Json<ExportResult>> {
    tracing::info!("Export job triggered");
    let result = match state.export.run().await {
        Ok(result) => result,
        Err(e) => {
            state.app_tokens.invalidate_if_rejected(&e).await;
            return Err(e);
        }
    };

    tracing::info!(
        worksheet = %result.worksheet,
        rows = result.rows,
        failed = result.summary.failed.len(),
        "Export job finished"
    );

    Ok(Json(result))
}
