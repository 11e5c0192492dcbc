mod health;
mod tools;

pub use crate::api::health::health_check;
pub use crate::api::tools::{call_tool, list_tools};

use utoipa::OpenApi;

use crate::model::global_error::ErrorResponse;
use crate::model::{
    Comment, Component, ComponentListResponse, Issue, IssueDetailsRequest, IssueDetailsResponse, IssueLinksRequest,
    IssueLinksResponse, IssueListResponse, Link, LinkDirection, ListComponentsRequest, ListIssuesRequest,
    ProjectStats, ProjectSummaryResponse,
};
use crate::tool::ToolDescriptor;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        tools::list_tools,
        tools::call_tool,
    ),
    components(schemas(
        ToolDescriptor,
        ErrorResponse,
        ListIssuesRequest,
        IssueListResponse,
        IssueDetailsRequest,
        IssueDetailsResponse,
        IssueLinksRequest,
        IssueLinksResponse,
        Issue,
        Comment,
        Link,
        LinkDirection,
        ProjectSummaryResponse,
        ProjectStats,
        ListComponentsRequest,
        ComponentListResponse,
        Component,
    )),
    tags(
        (name = "health check"),
        (name = "tools", description = "Issue warehouse tools"),
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_tool_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/tools"));
        assert!(doc.paths.paths.contains_key("/tools/{name}"));
        assert!(doc.paths.paths.contains_key("/health-check"));
    }
}
