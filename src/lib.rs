// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Planner Dashboard: staff task overview backed by Microsoft Graph
//!
//! This crate signs staff in through Azure AD, serves their Planner tasks
//! enriched with plan, bucket and people data, and runs the daily event
//! digest and task export jobs.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{
    AppTokenProvider, DigestJob, ExportJob, GraphClient, IdentityClient, SessionManager,
    TaskEnricher,
};
use std::time::Duration;

/// Upper bound on any single outbound HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityClient,
    pub sessions: SessionManager,
    pub app_tokens: AppTokenProvider,
    pub graph: GraphClient,
    pub enricher: TaskEnricher,
    pub digest: DigestJob,
    pub export: ExportJob,
}

impl AppState {
    /// Wire every service from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        let identity = IdentityClient::new(http.clone(), &config);
        let sessions = SessionManager::new(identity.clone());
        let app_tokens = AppTokenProvider::new(identity.clone());
        let graph = GraphClient::new(http.clone(), config.graph_base_url());
        let enricher = TaskEnricher::new(graph.clone(), config.tenant_id.clone());

        let digest = DigestJob::new(
            http,
            graph.clone(),
            app_tokens.clone(),
            config.digest_summary_url.clone(),
            config.mail_sender.clone(),
            config.digest_recipients.clone(),
        );
        let export = ExportJob::new(
            graph.clone(),
            app_tokens.clone(),
            config.export_recipients.clone(),
            config.export_workbook_path.clone(),
            config.tenant_id.clone(),
        );

        Ok(Self {
            config,
            identity,
            sessions,
            app_tokens,
            graph,
            enricher,
            digest,
            export,
        })
    }
}
