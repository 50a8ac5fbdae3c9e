// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task enrichment: join Planner tasks with plan, bucket and user data.
//!
//! Pipeline for one user:
//! 1. Resolve the user (fatal on failure)
//! 2. List the user's plans (fatal on failure)
//! 3. Buckets for every plan, concurrently (best-effort)
//! 4. Tasks for every plan, concurrently (best-effort), flattened
//! 5. Keep tasks assigned to the user
//! 6. Resolve every creator and assignee, concurrently (best-effort)
//! 7. Project into [`EnrichedTask`]
//! 8. Stable sort by priority, descending

use crate::error::AppError;
use crate::models::{CreatedBy, EnrichedTask, PlannerTask, TasksResponse, User};
use crate::services::batch::NameMaps;
use crate::services::GraphClient;
use futures_util::future::join_all;
use std::collections::{BTreeSet, HashMap};

/// Planner deep link for a task.
pub fn task_link(tenant_id: &str, task_id: &str) -> String {
    format!(
        "https://tasks.office.com/{}/Home/Task/{}",
        tenant_id,
        urlencoding::encode(task_id)
    )
}

/// Tasks whose assignments include `user_id`, in their original order.
pub fn assigned_to_user(tasks: Vec<PlannerTask>, user_id: &str) -> Vec<PlannerTask> {
    tasks
        .into_iter()
        .filter(|t| t.is_assigned_to(user_id))
        .collect()
}

/// Distinct creator and assignee IDs referenced by `tasks`.
pub fn referenced_user_ids(tasks: &[PlannerTask]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for task in tasks {
        if let Some(creator) = task.creator_id() {
            ids.insert(creator.to_string());
        }
        ids.extend(task.assignments.keys().cloned());
    }
    ids
}

/// Build the denormalized view of one task.
///
/// Assignees that did not resolve are dropped; names that did not resolve
/// become the "Unknown ..." placeholders.
pub fn enrich_task(
    task: PlannerTask,
    names: &NameMaps,
    users: &HashMap<String, User>,
    tenant_id: &str,
) -> EnrichedTask {
    let assigned_to = task
        .assignments
        .keys()
        .filter_map(|id| users.get(id).cloned())
        .collect();

    let created_by = CreatedBy {
        user: task.creator_id().and_then(|id| users.get(id).cloned()),
    };

    EnrichedTask {
        plan_name: names.plan_name(&task.plan_id),
        bucket_name: names.bucket_name(task.bucket_id.as_deref()),
        teams_link: task_link(tenant_id, &task.id),
        created_by,
        assigned_to,
        id: task.id,
        title: task.title,
        percent_complete: task.percent_complete,
        due_date_time: task.due_date_time,
        priority: task.priority,
        created_date_time: task.created_date_time,
        completed_date_time: task.completed_date_time,
        active_checklist_item_count: task.active_checklist_item_count,
        checklist_item_count: task.checklist_item_count,
        assignments: task.assignments,
        plan_id: task.plan_id,
        bucket_id: task.bucket_id,
    }
}

/// Highest priority value first; equal priorities keep their order.
pub fn sort_by_priority(tasks: &mut [EnrichedTask]) {
    tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Runs the enrichment pipeline against Graph.
#[derive(Clone)]
pub struct TaskEnricher {
    graph: GraphClient,
    tenant_id: String,
}

impl TaskEnricher {
    pub fn new(graph: GraphClient, tenant_id: String) -> Self {
        Self { graph, tenant_id }
    }

    /// Enriched tasks assigned to `user_id` (object ID or UPN/email).
    pub async fn tasks_for_user(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<TasksResponse, AppError> {
        let user = self.graph.get_user(access_token, user_id).await?;
        let plans = self.graph.list_user_plans(access_token, &user.id).await?;

        let bucket_fetches = plans
            .iter()
            .map(|p| self.graph.list_plan_buckets(access_token, &p.id));
        let task_fetches = plans
            .iter()
            .map(|p| self.graph.list_plan_tasks(access_token, &p.id));
        let (buckets, tasks) = tokio::join!(join_all(bucket_fetches), join_all(task_fetches));

        let buckets: Vec<_> = buckets.into_iter().flatten().collect();
        let all_tasks: Vec<PlannerTask> = tasks.into_iter().flatten().collect();
        let total_fetched = all_tasks.len();

        let user_tasks = assigned_to_user(all_tasks, &user.id);

        tracing::info!(
            user_id = %user.id,
            plans = plans.len(),
            total_fetched,
            assigned = user_tasks.len(),
            "User tasks filtered"
        );

        let user_ids = referenced_user_ids(&user_tasks);
        let users = self.graph.get_users_by_ids(access_token, &user_ids).await;

        let names = NameMaps::from_lists(&plans, &buckets);
        let mut enriched: Vec<EnrichedTask> = user_tasks
            .into_iter()
            .map(|t| enrich_task(t, &names, &users, &self.tenant_id))
            .collect();
        sort_by_priority(&mut enriched);

        Ok(TasksResponse {
            total_tasks: enriched.len(),
            user,
            tasks: enriched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, IdentitySet};
    use std::collections::BTreeMap;

    fn task(id: &str, priority: i32, assignees: &[&str]) -> PlannerTask {
        PlannerTask {
            id: id.to_string(),
            title: format!("Task {}", id),
            percent_complete: 0,
            due_date_time: None,
            priority,
            created_date_time: None,
            completed_date_time: None,
            active_checklist_item_count: 0,
            checklist_item_count: 0,
            created_by: Some(IdentitySet {
                user: Some(Identity {
                    id: "creator".to_string(),
                    display_name: None,
                }),
            }),
            assignments: assignees
                .iter()
                .map(|a| (a.to_string(), serde_json::json!({})))
                .collect::<BTreeMap<_, _>>(),
            plan_id: "p1".to_string(),
            bucket_id: Some("b1".to_string()),
        }
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            email: None,
            user_principal_name: None,
        }
    }

    #[test]
    fn test_assigned_to_user_filters() {
        let tasks = vec![task("a", 1, &["u1"]), task("b", 1, &["u2"]), task("c", 1, &["u2", "u1"])];
        let ids: Vec<_> = assigned_to_user(tasks, "u1")
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_referenced_user_ids_include_creator() {
        let tasks = vec![task("a", 1, &["u1", "u2"]), task("b", 1, &["u2"])];
        let ids: Vec<_> = referenced_user_ids(&tasks).into_iter().collect();
        assert_eq!(ids, vec!["creator", "u1", "u2"]);
    }

    #[test]
    fn test_enrich_drops_unresolved_assignees() {
        let users: HashMap<_, _> = [("u1".to_string(), user("u1"))].into_iter().collect();
        let names = NameMaps::default();

        let enriched = enrich_task(task("a", 5, &["u1", "ghost"]), &names, &users, "tenant");

        assert_eq!(enriched.assigned_to.len(), 1);
        assert_eq!(enriched.assigned_to[0].id, "u1");
        assert_eq!(enriched.assignments.len(), 2);
        assert!(enriched.created_by.user.is_none());
        assert_eq!(enriched.plan_name, "Unknown Plan");
        assert_eq!(enriched.bucket_name, "Unknown Bucket");
        assert_eq!(
            enriched.teams_link,
            "https://tasks.office.com/tenant/Home/Task/a"
        );
    }

    #[test]
    fn test_enrich_resolves_names() {
        let mut names = NameMaps::default();
        names.plans.insert("p1".to_string(), "Launch".to_string());
        names.buckets.insert("b1".to_string(), "Doing".to_string());
        let users: HashMap<_, _> = [("creator".to_string(), user("creator"))]
            .into_iter()
            .collect();

        let enriched = enrich_task(task("a", 5, &[]), &names, &users, "tenant");

        assert_eq!(enriched.plan_name, "Launch");
        assert_eq!(enriched.bucket_name, "Doing");
        assert_eq!(enriched.created_by.user.unwrap().display_name, "CREATOR");
        assert!(enriched.assigned_to.is_empty());
    }

    #[test]
    fn test_sort_by_priority_is_stable_descending() {
        let names = NameMaps::default();
        let users = HashMap::new();
        let mut tasks: Vec<_> = [("a", 1), ("b", 5), ("c", 1), ("d", 9), ("e", 5)]
            .into_iter()
            .map(|(id, p)| enrich_task(task(id, p, &[]), &names, &users, "t"))
            .collect();

        sort_by_priority(&mut tasks);

        let order: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "e", "a", "c"]);
    }
}
