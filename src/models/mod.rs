// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credential;
pub mod summary;
pub mod task;
pub mod user;

pub use credential::{Credential, REFRESH_ACCESS_TOKEN_ERROR};
pub use summary::{JobFailure, JobSummary, Severity, SummaryRow};
pub use task::{
    Bucket, CreatedBy, EnrichedTask, Identity, IdentitySet, Plan, PlannerTask, TasksResponse,
};
pub use user::User;
