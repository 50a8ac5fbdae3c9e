// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Planner task models: the raw Graph shape and the enriched view.

use super::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Planner plan (`/users/{id}/planner/plans`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Planner bucket (`/planner/plans/{id}/buckets`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// Reference to a directory user inside an identity set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Graph `identitySet`; only the user part is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySet {
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Planner task as returned by Graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub due_date_time: Option<DateTime<Utc>>,
    /// 0 (urgent) to 10 (low)
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_checklist_item_count: u32,
    #[serde(default)]
    pub checklist_item_count: u32,
    #[serde(default)]
    pub created_by: Option<IdentitySet>,
    /// Keyed by assignee user ID; values are Graph assignment metadata.
    #[serde(default)]
    pub assignments: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub bucket_id: Option<String>,
}

impl PlannerTask {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignments.contains_key(user_id)
    }

    pub fn creator_id(&self) -> Option<&str> {
        self.created_by
            .as_ref()
            .and_then(|c| c.user.as_ref())
            .map(|u| u.id.as_str())
    }
}

/// Creator with the directory user resolved (absent if lookup failed).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatedBy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Denormalized task sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTask {
    pub id: String,
    pub title: String,
    pub percent_complete: u8,
    pub due_date_time: Option<DateTime<Utc>>,
    pub priority: i32,
    pub created_date_time: Option<DateTime<Utc>>,
    pub completed_date_time: Option<DateTime<Utc>>,
    pub active_checklist_item_count: u32,
    pub checklist_item_count: u32,
    pub created_by: CreatedBy,
    pub assignments: BTreeMap<String, serde_json::Value>,
    pub assigned_to: Vec<User>,
    pub plan_id: String,
    pub bucket_id: Option<String>,
    pub plan_name: String,
    pub bucket_name: String,
    pub teams_link: String,
}

/// Body of `GET /api/tasks`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksResponse {
    pub user: User,
    pub tasks: Vec<EnrichedTask>,
    pub total_tasks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_graph_payload() {
        let task: PlannerTask = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "title": "Ship it",
            "percentComplete": 50,
            "dueDateTime": "2026-03-01T17:00:00Z",
            "priority": 3,
            "createdDateTime": "2026-02-01T09:30:00.1234567Z",
            "completedDateTime": null,
            "activeChecklistItemCount": 1,
            "checklistItemCount": 4,
            "createdBy": {"user": {"id": "creator", "displayName": null}},
            "assignments": {
                "u1": {"@odata.type": "#microsoft.graph.plannerAssignment", "orderHint": "8585"}
            },
            "planId": "p1",
            "bucketId": "b1",
            "orderHint": "ignored"
        }))
        .unwrap();

        assert!(task.is_assigned_to("u1"));
        assert!(!task.is_assigned_to("u2"));
        assert_eq!(task.creator_id(), Some("creator"));
        assert!(task.completed_date_time.is_none());
    }

    #[test]
    fn test_task_without_creator() {
        let task: PlannerTask =
            serde_json::from_value(serde_json::json!({"id": "t1", "planId": "p1"})).unwrap();
        assert_eq!(task.creator_id(), None);
        assert!(task.assignments.is_empty());
    }
}
