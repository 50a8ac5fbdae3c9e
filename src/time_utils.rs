// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, Utc};

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Worksheet name for a given export day (`YYYY-MM-DD`).
pub fn worksheet_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Export cell format for an optional timestamp; empty when absent.
pub fn format_export_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
