// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::TasksResponse;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/tasks", get(get_tasks))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
pub struct MeResponse {
    pub email: String,
    pub name: String,
}

/// Get the signed-in user.
async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        email: user.email,
        name: user.name,
    })
}

// ─── Tasks ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TasksQuery {
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

/// Delegated token for the caller's own tasks, service token otherwise.
async fn token_for(state: &AppState, user: &AuthUser, user_id: &str) -> Result<String> {
    if user.email.eq_ignore_ascii_case(user_id) {
        return Ok(user.access_token.clone());
    }

    tracing::debug!(
        caller = %user.email,
        user_id = %user_id,
        "Using service token for another user's tasks"
    );
    state.app_tokens.access_token().await
}

/// Get a user's enriched Planner tasks.
async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksResponse>> {
    let user_id = query
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;

    let token = token_for(&state, &user, &user_id).await?;
    let response = match state.enricher.tasks_for_user(&user_id, &token).await {
        Ok(response) => response,
        Err(e) => {
            if token != user.access_token {
                state.app_tokens.invalidate_if_rejected(&e).await;
            }
            return Err(e);
        }
    };

    tracing::info!(
        user_id = %user_id,
        total_tasks = response.total_tasks,
        "Served tasks"
    );

    Ok(Json(response))
}
