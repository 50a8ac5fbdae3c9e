// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event summary rows and job outcome reporting.

use serde::{Deserialize, Serialize};

/// One row of the pre-aggregated event summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub event: String,
    #[serde(default)]
    pub eta: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub sold: i64,
    /// Sold percentage of capacity (0-100)
    #[serde(default)]
    pub percentage: f64,
}

/// Sales band used to colour a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `< 30` low, `< 80` medium, otherwise high.
    pub fn classify(percentage: f64) -> Self {
        if percentage < 30.0 {
            Severity::Low
        } else if percentage < 80.0 {
            Severity::Medium
        } else {
            Severity::High
        }
    }

    /// CSS class name in the digest template.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// An item a job could not complete.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobFailure {
    pub item: String,
    pub error: String,
}

/// Per-item outcome of a job that fans out over recipients.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<JobFailure>,
}

impl JobSummary {
    pub fn record(&mut self, item: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.succeeded.push(item.to_string()),
            Err(error) => self.failed.push(JobFailure {
                item: item.to_string(),
                error,
            }),
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}
