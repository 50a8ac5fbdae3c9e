// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Microsoft Graph client for users, Planner, mail and batching.
//!
//! Lookups of the primary subject (a user, their plans, their tasks)
//! propagate errors. Per-plan bucket/task lookups and per-user profile
//! lookups are best-effort: a failure is logged and yields an empty
//! result so an aggregate fetch can still complete.

use crate::error::AppError;
use crate::models::{Bucket, Plan, PlannerTask, User};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Graph collection page.
#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// One request inside a `$batch` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequest {
    pub id: String,
    pub method: String,
    /// Path relative to the Graph version root
    pub url: String,
}

/// One response from a `$batch` call.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    #[serde(default)]
    responses: Vec<BatchResponse>,
}

/// Graph REST client.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    /// `base_url` is the version root, e.g. `https://graph.microsoft.com/v1.0`.
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    /// Get a user by object ID or UPN.
    pub async fn get_user(&self, access_token: &str, user_id: &str) -> Result<User, AppError> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(user_id));
        let user: User = self.get_json(&url, access_token).await?;
        Ok(user.with_email_fallback())
    }

    /// Profile of the token's owner.
    pub async fn get_me(&self, access_token: &str) -> Result<User, AppError> {
        let url = format!("{}/me", self.base_url);
        let user: User = self.get_json(&url, access_token).await?;
        Ok(user.with_email_fallback())
    }

    /// Resolve many users concurrently.
    ///
    /// Users that cannot be fetched are logged and left out of the map.
    pub async fn get_users_by_ids<'a, I>(
        &self,
        access_token: &str,
        user_ids: I,
    ) -> HashMap<String, User>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let lookups = user_ids.into_iter().map(|id| async move {
            match self.get_user(access_token, id).await {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(user_id = %id, error = %e, "Failed to fetch user");
                    None
                }
            }
        });

        join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect()
    }

    // ─── Planner ─────────────────────────────────────────────────────────────

    /// Plans the user is a member of.
    pub async fn list_user_plans(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<Plan>, AppError> {
        let url = format!(
            "{}/users/{}/planner/plans",
            self.base_url,
            urlencoding::encode(user_id)
        );
        self.get_collection(&url, access_token).await
    }

    /// Tasks assigned to the user across all plans.
    pub async fn list_user_tasks(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<PlannerTask>, AppError> {
        let url = format!(
            "{}/users/{}/planner/tasks",
            self.base_url,
            urlencoding::encode(user_id)
        );
        self.get_collection(&url, access_token).await
    }

    /// Buckets of a plan; empty if the plan cannot be read.
    pub async fn list_plan_buckets(&self, access_token: &str, plan_id: &str) -> Vec<Bucket> {
        let url = format!(
            "{}/planner/plans/{}/buckets",
            self.base_url,
            urlencoding::encode(plan_id)
        );
        self.get_collection(&url, access_token)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(plan_id, error = %e, "Failed to fetch buckets for plan");
                Vec::new()
            })
    }

    /// Tasks of a plan; empty if the plan cannot be read.
    pub async fn list_plan_tasks(&self, access_token: &str, plan_id: &str) -> Vec<PlannerTask> {
        let url = format!(
            "{}/planner/plans/{}/tasks",
            self.base_url,
            urlencoding::encode(plan_id)
        );
        self.get_collection(&url, access_token)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(plan_id, error = %e, "Failed to fetch tasks for plan");
                Vec::new()
            })
    }

    // ─── Batch & Mail ────────────────────────────────────────────────────────

    /// Send up to 20 requests in one `$batch` round trip.
    pub async fn batch(
        &self,
        access_token: &str,
        requests: &[BatchRequest],
    ) -> Result<Vec<BatchResponse>, AppError> {
        let url = format!("{}/$batch", self.base_url);
        let body = serde_json::json!({ "requests": requests });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let envelope: BatchEnvelope = check_response_json(response).await?;
        Ok(envelope.responses)
    }

    /// Send an HTML message from `sender`'s mailbox to a single recipient.
    pub async fn send_mail(
        &self,
        access_token: &str,
        sender: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/users/{}/sendMail",
            self.base_url,
            urlencoding::encode(sender)
        );

        let body = serde_json::json!({
            "message": {
                "subject": subject,
                "body": {
                    "contentType": "HTML",
                    "content": html
                },
                "toRecipients": [
                    { "emailAddress": { "address": to } }
                ]
            }
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        check_response(response).await
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self.http.get(url).bearer_auth(access_token).send().await?;
        check_response_json(response).await
    }

    /// GET every page of a collection, following `@odata.nextLink`.
    async fn get_collection<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<Vec<T>, AppError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            let page: Collection<T> = self.get_json(&page_url, access_token).await?;
            items.extend(page.value);
            next = page.next_link;
        }

        Ok(items)
    }
}

/// Check response status and return error if not successful.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream {
        status: status.as_u16(),
        message: upstream_message(status, &body),
    })
}

/// Check response and parse JSON body.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message: upstream_message(status, &body),
        });
    }

    let status = response.status();
    response.json().await.map_err(|e| AppError::Upstream {
        status: status.as_u16(),
        message: format!("JSON parse error: {}", e),
    })
}

/// Prefer Graph's `error.message`, falling back to the status reason.
fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}
