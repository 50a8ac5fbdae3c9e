// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Excel workbook editing through a persistent Graph workbook session.

use crate::error::AppError;
use crate::services::graph::{check_response, check_response_json, GraphClient};
use serde::Deserialize;

/// Header carrying the workbook session ID on every call.
const SESSION_HEADER: &str = "workbook-session-id";

#[derive(Debug, Deserialize)]
struct SessionInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Worksheet {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WorksheetList {
    #[serde(default)]
    value: Vec<Worksheet>,
}

/// Open editing session on one workbook drive item.
pub struct WorkbookSession<'a> {
    graph: &'a GraphClient,
    access_token: String,
    /// `{graph}/{item path}/workbook`
    workbook_url: String,
    session_id: String,
}

impl<'a> WorkbookSession<'a> {
    /// Create a session with `persistChanges: true`.
    ///
    /// `item_path` is the drive item path, e.g. `/users/{id}/drive/items/{item}`.
    pub async fn open(
        graph: &'a GraphClient,
        access_token: &str,
        item_path: &str,
    ) -> Result<WorkbookSession<'a>, AppError> {
        if item_path.is_empty() {
            return Err(AppError::NotFound(
                "export workbook is not configured".to_string(),
            ));
        }

        let workbook_url = format!(
            "{}/{}/workbook",
            graph.base_url(),
            item_path.trim_matches('/')
        );

        let response = graph
            .http()
            .post(format!("{}/createSession", workbook_url))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "persistChanges": true }))
            .send()
            .await?;

        let info: SessionInfo = check_response_json(response).await.map_err(|e| {
            if e.upstream_status() == Some(404) {
                AppError::NotFound(format!("workbook {}", item_path))
            } else {
                e
            }
        })?;

        tracing::debug!(item_path, "Workbook session opened");

        Ok(Self {
            graph,
            access_token: access_token.to_string(),
            workbook_url,
            session_id: info.id,
        })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.graph
            .http()
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(SESSION_HEADER, &self.session_id)
    }

    fn worksheet_url(&self, name: &str) -> String {
        format!(
            "{}/worksheets/{}",
            self.workbook_url,
            urlencoding::encode(name)
        )
    }

    /// Make sure a worksheet called `name` exists.
    ///
    /// Returns `true` if it had to be created.
    pub async fn ensure_worksheet(&self, name: &str) -> Result<bool, AppError> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}/worksheets?$select=name", self.workbook_url),
            )
            .send()
            .await?;
        let sheets: WorksheetList = check_response_json(response).await?;

        if sheets.value.iter().any(|s| s.name == name) {
            tracing::debug!(worksheet = name, "Reusing existing worksheet");
            return Ok(false);
        }

        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/worksheets/add", self.workbook_url),
            )
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;

        match check_response(response).await {
            Ok(()) => {
                tracing::info!(worksheet = name, "Worksheet created");
                Ok(true)
            }
            // Created concurrently since we listed.
            Err(e) if e.upstream_status() == Some(409) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write a value grid into `address` (e.g. `A1:J4`) of a worksheet.
    pub async fn write_range(
        &self,
        worksheet: &str,
        address: &str,
        values: &[Vec<serde_json::Value>],
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/range(address='{}')",
            self.worksheet_url(worksheet),
            address
        );

        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&serde_json::json!({ "values": values }))
            .send()
            .await?;

        check_response(response).await.map_err(|e| {
            if e.upstream_status() == Some(404) {
                AppError::NotFound(format!("worksheet {}", worksheet))
            } else {
                e
            }
        })
    }

    /// Close the session; failures are only logged.
    pub async fn close(self) {
        let result = match self
            .request(
                reqwest::Method::POST,
                format!("{}/closeSession", self.workbook_url),
            )
            .send()
            .await
        {
            Ok(response) => check_response(response).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to close workbook session");
        }
    }
}

/// Range address covering `rows` rows of the ten export columns.
pub fn range_address(rows: usize) -> String {
    format!("A1:J{}", rows.max(1))
}
