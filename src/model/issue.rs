use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

fn default_limit() -> u32 {
    50
}

/// Filters accepted by the issue listing. Absent or zero values contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IssueFilters {
    pub project: Option<String>,
    pub issue_type: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search_text: Option<String>,
    /// Comma-separated component name/description terms.
    pub components: Option<String>,
    #[serde(default)]
    pub created_days: i64,
    #[serde(default)]
    pub updated_days: i64,
    #[serde(default)]
    pub resolved_days: i64,
    /// Matches created OR updated OR resolved; ignored when a specific window is set.
    #[serde(default)]
    pub timeframe: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListIssuesRequest {
    #[serde(flatten)]
    pub filters: IssueFilters,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ListIssuesRequest {
    fn default() -> Self {
        Self {
            filters: IssueFilters::default(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueDetailsRequest {
    pub issue_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueLinksRequest {
    pub issue_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Comment {
    pub id: Option<String>,
    pub role_level: Option<String>,
    pub body: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    /// The issue is the link source.
    Outward,
    /// The issue is the link destination.
    Inward,
}

/// A link seen from one of its two issues.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Link {
    pub link_id: Option<String>,
    pub relationship: LinkDirection,
    pub link_type: Option<String>,
    /// Outward text for outward links, inward text for inward ones.
    pub description: Option<String>,
    pub related_issue_id: String,
    pub related_issue_key: Option<String>,
    pub related_issue_summary: Option<String>,
    pub sequence: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Issue {
    pub id: i64,
    pub key: String,
    pub project: Option<String>,
    pub issue_number: Option<i64>,
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    pub description: String,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub resolution: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub due_date: Option<String>,
    pub resolution_date: Option<String>,
    pub votes: Option<i64>,
    pub watches: Option<i64>,
    pub environment: Option<String>,
    pub fix_version: Option<String>,
    pub time_original_estimate: Option<i64>,
    pub time_estimate: Option<i64>,
    pub time_spent: Option<i64>,
    pub workflow_id: Option<String>,
    pub security: Option<String>,
    pub archived: Option<String>,
    pub archived_date: Option<String>,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    pub links: Vec<Link>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueListResponse {
    pub issues: Vec<Issue>,
    pub total_returned: usize,
    pub filters_applied: ListIssuesRequest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueDetailsResponse {
    pub found_issues: BTreeMap<String, Issue>,
    pub not_found: Vec<String>,
    pub total_found: usize,
    pub total_requested: usize,
}

impl IssueDetailsResponse {
    pub fn empty() -> Self {
        Self {
            found_issues: BTreeMap::new(),
            not_found: Vec::new(),
            total_found: 0,
            total_requested: 0,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueLinksResponse {
    pub issue_key: String,
    pub issue_id: String,
    pub links: Vec<Link>,
    pub total_links: usize,
}
