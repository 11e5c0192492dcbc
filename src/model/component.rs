use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListComponentsRequest {
    /// Component project id, e.g. `12325621`.
    pub project: Option<String>,
    /// `Y` or `N`, any case.
    pub archived: Option<String>,
    /// `Y` or `N`, any case.
    pub deleted: Option<String>,
    /// Only components attached to this issue key.
    pub issue: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub search_text: Option<String>,
}

impl Default for ListComponentsRequest {
    fn default() -> Self {
        Self {
            project: None,
            archived: None,
            deleted: None,
            issue: None,
            limit: default_limit(),
            search_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Component {
    pub id: Option<String>,
    pub project: Option<String>,
    pub name: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub lead: Option<String>,
    pub assignee_type: Option<String>,
    pub archived: Option<String>,
    pub deleted: Option<String>,
    pub synced: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentListResponse {
    pub components: Vec<Component>,
    pub total_returned: usize,
    pub filters_applied: ListComponentsRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limit_defaults_to_fifty() {
        let request: ListComponentsRequest = serde_json::from_value(json!({"archived": "n"})).unwrap();
        assert_eq!(request.limit, 50);
        assert_eq!(request.archived.as_deref(), Some("n"));
    }
}
