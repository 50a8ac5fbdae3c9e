// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan and bucket name resolution through Graph `$batch`.
//!
//! Every lookup carries its kind, so responses are classified by what was
//! asked for rather than by which fields happen to be in the body.

use crate::models::{Bucket, Plan, PlannerTask};
use crate::services::graph::{BatchRequest, BatchResponse, GraphClient};
use std::collections::{HashMap, HashSet};

/// Graph rejects batches with more than 20 requests.
pub const MAX_BATCH_REQUESTS: usize = 20;

pub const UNKNOWN_PLAN: &str = "Unknown Plan";
pub const UNKNOWN_BUCKET: &str = "Unknown Bucket";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Plan,
    Bucket,
}

impl LookupKind {
    /// Relative Graph URL selecting just the display field.
    fn url(self, id: &str) -> String {
        let id = urlencoding::encode(id);
        match self {
            LookupKind::Plan => format!("/planner/plans/{}?$select=id,title", id),
            LookupKind::Bucket => format!("/planner/buckets/{}?$select=id,name", id),
        }
    }

    fn name_field(self) -> &'static str {
        match self {
            LookupKind::Plan => "title",
            LookupKind::Bucket => "name",
        }
    }
}

/// Plan ID → title and bucket ID → name lookup tables.
#[derive(Debug, Clone, Default)]
pub struct NameMaps {
    pub plans: HashMap<String, String>,
    pub buckets: HashMap<String, String>,
}

impl NameMaps {
    pub fn from_lists(plans: &[Plan], buckets: &[Bucket]) -> Self {
        Self {
            plans: plans
                .iter()
                .map(|p| (p.id.clone(), p.title.clone()))
                .collect(),
            buckets: buckets
                .iter()
                .map(|b| (b.id.clone(), b.name.clone()))
                .collect(),
        }
    }

    pub fn plan_name(&self, plan_id: &str) -> String {
        self.plans
            .get(plan_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PLAN.to_string())
    }

    pub fn bucket_name(&self, bucket_id: Option<&str>) -> String {
        bucket_id
            .and_then(|id| self.buckets.get(id))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_BUCKET.to_string())
    }
}

/// Set of distinct plan/bucket lookups.
#[derive(Debug, Clone, Default)]
pub struct NameBatch {
    /// Position in this list is the request's correlation ID.
    entries: Vec<(LookupKind, String)>,
    seen: HashSet<(LookupKind, String)>,
}

impl NameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups for every plan and bucket referenced by `tasks`.
    pub fn for_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a PlannerTask>,
    {
        let mut batch = Self::new();
        for task in tasks {
            batch.add(LookupKind::Plan, &task.plan_id);
            if let Some(bucket_id) = &task.bucket_id {
                batch.add(LookupKind::Bucket, bucket_id);
            }
        }
        batch
    }

    /// Add a lookup; duplicates and empty IDs are ignored.
    pub fn add(&mut self, kind: LookupKind, id: &str) {
        if id.is_empty() {
            return;
        }
        if self.seen.insert((kind, id.to_string())) {
            self.entries.push((kind, id.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requests split into `$batch`-sized chunks.
    pub fn requests(&self) -> Vec<Vec<BatchRequest>> {
        let all: Vec<BatchRequest> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, (kind, id))| BatchRequest {
                id: idx.to_string(),
                method: "GET".to_string(),
                url: kind.url(id),
            })
            .collect();

        all.chunks(MAX_BATCH_REQUESTS)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Fold batch responses into name maps.
    ///
    /// Only 200 responses with a known correlation ID and the field
    /// expected for their kind contribute; everything else is skipped.
    pub fn apply(&self, responses: &[BatchResponse], maps: &mut NameMaps) {
        for response in responses {
            if response.status != 200 {
                tracing::debug!(id = %response.id, status = response.status, "Batch lookup failed");
                continue;
            }

            let Some((kind, target_id)) = response
                .id
                .parse::<usize>()
                .ok()
                .and_then(|idx| self.entries.get(idx))
            else {
                tracing::warn!(id = %response.id, "Batch response with unknown id");
                continue;
            };

            let Some(name) = response.body[kind.name_field()].as_str() else {
                continue;
            };

            let map = match kind {
                LookupKind::Plan => &mut maps.plans,
                LookupKind::Bucket => &mut maps.buckets,
            };
            map.insert(target_id.clone(), name.to_string());
        }
    }

    /// Run every chunk against Graph.
    ///
    /// A failed chunk is logged and its names stay unresolved.
    pub async fn resolve(&self, graph: &GraphClient, access_token: &str) -> NameMaps {
        let mut maps = NameMaps::default();

        for chunk in self.requests() {
            match graph.batch(access_token, &chunk).await {
                Ok(responses) => self.apply(&responses, &mut maps),
                Err(e) => {
                    tracing::warn!(error = %e, requests = chunk.len(), "Batch name lookup failed");
                }
            }
        }

        tracing::debug!(
            plans = maps.plans.len(),
            buckets = maps.buckets.len(),
            "Resolved plan and bucket names"
        );
        maps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(id: &str, status: u16, body: serde_json::Value) -> BatchResponse {
        BatchResponse {
            id: id.to_string(),
            status,
            body,
        }
    }

    #[test]
    fn test_requests_are_deduplicated_and_chunked() {
        let mut batch = NameBatch::new();
        for i in 0..25 {
            batch.add(LookupKind::Plan, &format!("p{}", i));
        }
        batch.add(LookupKind::Plan, "p0");
        batch.add(LookupKind::Bucket, "p0");
        batch.add(LookupKind::Bucket, "");

        assert_eq!(batch.len(), 26);

        let chunks = batch.requests();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_BATCH_REQUESTS);
        assert_eq!(chunks[1].len(), 6);
        assert_eq!(chunks[1][0].id, "20");
        assert_eq!(chunks[1][5].url, "/planner/buckets/p0?$select=id,name");
    }

    #[test]
    fn test_apply_classifies_by_requested_kind() {
        let mut batch = NameBatch::new();
        batch.add(LookupKind::Plan, "p1");
        batch.add(LookupKind::Bucket, "b1");
        batch.add(LookupKind::Bucket, "b2");
        batch.add(LookupKind::Plan, "p2");

        let responses = vec![
            response("0", 200, json!({"id": "p1", "title": "Launch"})),
            // A bucket body carrying a title is still a bucket.
            response("1", 200, json!({"id": "b1", "name": "Backlog", "title": "x"})),
            // Neither expected field: ignored.
            response("2", 200, json!({"id": "b2"})),
            response("3", 404, json!({"error": {"code": "NotFound"}})),
            response("99", 200, json!({"id": "zz", "title": "Stray"})),
        ];

        let mut maps = NameMaps::default();
        batch.apply(&responses, &mut maps);

        assert_eq!(maps.plans.len(), 1);
        assert_eq!(maps.plans["p1"], "Launch");
        assert_eq!(maps.buckets.len(), 1);
        assert_eq!(maps.buckets["b1"], "Backlog");
        assert_eq!(maps.bucket_name(Some("b2")), UNKNOWN_BUCKET);
        assert_eq!(maps.plan_name("p2"), UNKNOWN_PLAN);
    }

    #[test]
    fn test_bucket_name_without_bucket_id() {
        let maps = NameMaps::default();
        assert_eq!(maps.bucket_name(None), UNKNOWN_BUCKET);
    }
}
