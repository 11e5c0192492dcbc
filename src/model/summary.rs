use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectStats {
    pub total_issues: u64,
    pub statuses: BTreeMap<String, u64>,
    pub priorities: BTreeMap<String, u64>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectSummaryResponse {
    pub total_issues: u64,
    pub total_projects: usize,
    pub projects: BTreeMap<String, ProjectStats>,
}

impl ProjectSummaryResponse {
    /// Adds one project/status/priority bucket to the running totals.
    pub fn record(&mut self, project: String, status: String, priority: String, count: u64) {
        let stats = self.projects.entry(project).or_default();
        stats.total_issues += count;
        *stats.statuses.entry(status).or_insert(0) += count;
        *stats.priorities.entry(priority).or_insert(0) += count;

        self.total_issues += count;
        self.total_projects = self.projects.len();
    }
}
