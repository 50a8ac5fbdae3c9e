// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily event summary email.

use crate::error::AppError;
use crate::models::{JobSummary, Severity, SummaryRow};
use crate::services::{AppTokenProvider, GraphClient};
use std::fmt::Write as _;

pub const DIGEST_SUBJECT: &str = "Daily Event Summary";

const DIGEST_STYLE: &str = r#"<style>
  table { width: 100%; border-collapse: collapse; font-family: Arial, sans-serif; font-size: 14px; }
  th, td { text-align: left; padding: 12px; border-bottom: 1px solid #ddd; }
  th { background-color: #f5f5f5; }
  .low { color: #d32f2f; font-weight: bold; }
  .medium { color: #f9a825; font-weight: bold; }
  .high { color: #388e3c; font-weight: bold; }
  .footer { margin-top: 20px; font-size: 13px; color: #666; }
</style>"#;

/// Minimal HTML escaping for text and attribute content.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the summary rows as the digest email body.
pub fn render_summary_html(rows: &[SummaryRow]) -> String {
    let mut html = String::new();
    html.push_str("<h3>Attention Network Event Summary</h3>\n");
    html.push_str(DIGEST_STYLE);
    html.push_str(
        "\n<table>\n<thead><tr><th>Event</th><th>ETA</th><th>Capacity</th><th>Sold</th><th>Sold %</th></tr></thead>\n<tbody>\n",
    );

    for row in rows {
        let class = Severity::classify(row.percentage).css_class();
        // Writing to a String cannot fail.
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{class}\">{}</td><td class=\"{class}\">{}%</td></tr>",
            escape_html(&row.event),
            escape_html(&row.eta),
            row.capacity,
            row.sold,
            row.percentage,
        );
    }

    let noun = if rows.len() == 1 { "event" } else { "events" };
    let _ = write!(
        html,
        "</tbody>\n</table>\n<div class=\"footer\">Showing {} upcoming {}.</div>\n",
        rows.len(),
        noun
    );
    html
}

/// Sends the event summary to a fixed recipient list.
#[derive(Clone)]
pub struct DigestJob {
    http: reqwest::Client,
    graph: GraphClient,
    tokens: AppTokenProvider,
    summary_url: String,
    sender: String,
    recipients: Vec<String>,
}

impl DigestJob {
    pub fn new(
        http: reqwest::Client,
        graph: GraphClient,
        tokens: AppTokenProvider,
        summary_url: String,
        sender: String,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            http,
            graph,
            tokens,
            summary_url,
            sender,
            recipients,
        }
    }

    async fn fetch_summary(&self) -> Result<Vec<SummaryRow>, AppError> {
        if self.summary_url.is_empty() {
            return Err(AppError::NotFound(
                "digest summary URL is not configured".to_string(),
            ));
        }

        let response = self.http.get(&self.summary_url).send().await;
        let rows = match response {
            Ok(response) => crate::services::graph::check_response_json(response).await,
            Err(e) => Err(e.into()),
        };
        rows.map_err(|e| match e {
            AppError::Upstream { status, message } => AppError::Summary { status, message },
            other => other,
        })
    }

    /// Fetch, render and send. Individual send failures are recorded in
    /// the summary and never stop the remaining sends.
    pub async fn run(&self) -> Result<JobSummary, AppError> {
        if self.sender.is_empty() {
            return Err(AppError::NotFound("mail sender is not configured".to_string()));
        }

        let token = self.tokens.access_token().await?;
        let rows = self.fetch_summary().await?;
        let html = render_summary_html(&rows);

        tracing::info!(
            rows = rows.len(),
            recipients = self.recipients.len(),
            "Sending event digest"
        );

        let mut summary = JobSummary::default();
        for recipient in &self.recipients {
            let result = self
                .graph
                .send_mail(&token, &self.sender, recipient, DIGEST_SUBJECT, &html)
                .await;

            match &result {
                Ok(()) => tracing::info!(recipient = %recipient, "Email sent"),
                Err(e) => tracing::warn!(recipient = %recipient, error = %e, "Failed to send email"),
            }
            summary.record(recipient, result.map_err(|e| e.to_string()));
        }

        Ok(summary)
    }
}
