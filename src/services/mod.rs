// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod app_token;
pub mod batch;
pub mod digest;
pub mod enrichment;
pub mod export;
pub mod graph;
pub mod identity;
pub mod session;
pub mod workbook;

pub use app_token::AppTokenProvider;
pub use batch::{LookupKind, NameBatch, NameMaps};
pub use digest::DigestJob;
pub use enrichment::TaskEnricher;
pub use export::{ExportJob, ExportResult};
pub use graph::GraphClient;
pub use identity::{IdentityClient, TokenResponse};
pub use session::{Session, SessionManager};
pub use workbook::WorkbookSession;
