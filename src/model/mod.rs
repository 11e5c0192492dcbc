pub mod component;
pub mod global_error;
pub mod issue;
pub mod summary;

pub use component::{Component, ComponentListResponse, ListComponentsRequest};
pub use issue::{
    Comment, Issue, IssueDetailsRequest, IssueDetailsResponse, IssueFilters, IssueLinksRequest, IssueLinksResponse,
    IssueListResponse, Link, LinkDirection, ListIssuesRequest,
};
pub use summary::{ProjectStats, ProjectSummaryResponse};
