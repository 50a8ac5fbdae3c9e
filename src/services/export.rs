// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily task export into an Excel worksheet.
//!
//! All recipients' Planner tasks are fetched concurrently, plan and bucket
//! names are resolved with `$batch`, and the rows are written into a
//! worksheet named after the export date with a single range write.

use crate::error::AppError;
use crate::models::{JobSummary, PlannerTask};
use crate::services::batch::{NameBatch, NameMaps};
use crate::services::enrichment::task_link;
use crate::services::workbook::{range_address, WorkbookSession};
use crate::services::{AppTokenProvider, GraphClient};
use crate::time_utils::{format_export_date, worksheet_name};
use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;

/// Column headers, in output order.
pub const EXPORT_COLUMNS: [&str; 10] = [
    "User",
    "Title",
    "Plan",
    "Bucket",
    "Priority",
    "Progress",
    "Due Date",
    "Created",
    "Completed",
    "Link",
];

/// Planner priority as a label: 0-3 High, 4-6 Medium, 7+ Low.
pub fn priority_label(priority: i32) -> &'static str {
    if priority <= 3 {
        "High"
    } else if priority <= 6 {
        "Medium"
    } else {
        "Low"
    }
}

/// Header row followed by one row per task, grouped by user.
pub fn build_grid(
    tasks_by_user: &[(String, Vec<PlannerTask>)],
    names: &NameMaps,
    tenant_id: &str,
) -> Vec<Vec<Value>> {
    let mut grid = vec![EXPORT_COLUMNS.iter().map(|c| Value::from(*c)).collect()];

    for (user, tasks) in tasks_by_user {
        for task in tasks {
            grid.push(vec![
                Value::from(user.as_str()),
                Value::from(task.title.as_str()),
                Value::from(names.plan_name(&task.plan_id)),
                Value::from(names.bucket_name(task.bucket_id.as_deref())),
                Value::from(priority_label(task.priority)),
                Value::from(format!("{}%", task.percent_complete)),
                Value::from(format_export_date(task.due_date_time)),
                Value::from(format_export_date(task.created_date_time)),
                Value::from(format_export_date(task.completed_date_time)),
                Value::from(task_link(tenant_id, &task.id)),
            ]);
        }
    }

    grid
}

/// Body of `GET /api/tasks/download`.
#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub updated: bool,
    pub worksheet: String,
    /// Rows written, header included
    pub rows: usize,
    #[serde(flatten)]
    pub summary: JobSummary,
}

/// Writes every recipient's tasks into the export workbook.
#[derive(Clone)]
pub struct ExportJob {
    graph: GraphClient,
    tokens: AppTokenProvider,
    recipients: Vec<String>,
    workbook_path: String,
    tenant_id: String,
}

impl ExportJob {
    pub fn new(
        graph: GraphClient,
        tokens: AppTokenProvider,
        recipients: Vec<String>,
        workbook_path: String,
        tenant_id: String,
    ) -> Self {
        Self {
            graph,
            tokens,
            recipients,
            workbook_path,
            tenant_id,
        }
    }

    /// Export into today's worksheet.
    pub async fn run(&self) -> Result<ExportResult, AppError> {
        self.run_for_date(Utc::now().date_naive()).await
    }

    pub async fn run_for_date(&self, date: NaiveDate) -> Result<ExportResult, AppError> {
        let token = self.tokens.access_token().await?;

        let fetches = self.recipients.iter().map(|email| {
            let token = token.as_str();
            async move { (email, self.graph.list_user_tasks(token, email).await) }
        });

        let mut summary = JobSummary::default();
        let mut tasks_by_user = Vec::with_capacity(self.recipients.len());
        for (email, result) in join_all(fetches).await {
            match result {
                Ok(tasks) => {
                    tracing::debug!(user = %email, tasks = tasks.len(), "Fetched user tasks");
                    summary.record(email, Ok(()));
                    tasks_by_user.push((email.clone(), tasks));
                }
                Err(e) => {
                    tracing::warn!(user = %email, error = %e, "Failed to fetch tasks for user");
                    summary.record(email, Err(e.to_string()));
                }
            }
        }

        let names = NameBatch::for_tasks(tasks_by_user.iter().flat_map(|(_, t)| t))
            .resolve(&self.graph, &token)
            .await;
        let grid = build_grid(&tasks_by_user, &names, &self.tenant_id);
        let sheet = worksheet_name(date);

        let session = WorkbookSession::open(&self.graph, &token, &self.workbook_path).await?;
        let written = async {
            session.ensure_worksheet(&sheet).await?;
            session
                .write_range(&sheet, &range_address(grid.len()), &grid)
                .await
        }
        .await;
        session.close().await;
        written?;

        tracing::info!(
            worksheet = %sheet,
            rows = grid.len(),
            failed_users = summary.failed.len(),
            "Task export written"
        );

        Ok(ExportResult {
            updated: true,
            worksheet: sheet,
            rows: grid.len(),
            summary,
        })
    }
}
