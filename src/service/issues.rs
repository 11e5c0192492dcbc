use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::Credential;
use crate::db::QueryExecutor;
use crate::entity::component::{self, ComponentRow};
use crate::entity::issue::{self, DescriptionView, IssueRow};
use crate::entity::project_count::ProjectCountRow;
use crate::entity::{COMPONENT_TABLE, ISSUE_COMPONENT_ASSOCIATION, ISSUE_TABLE, NODE_ASSOCIATION_TABLE};
use crate::model::component::{ComponentListResponse, ListComponentsRequest};
use crate::model::issue::{Issue, IssueDetailsResponse, IssueLinksResponse, IssueListResponse, ListIssuesRequest};
use crate::model::summary::ProjectSummaryResponse;
use crate::service::aggregate::{aggregate, decode_rows};
use crate::service::enrichment::{EnrichmentOrchestrator, Relations};
use crate::service::error::ServiceError;
use crate::service::predicate::{build_predicates, where_clause};
use crate::service::sanitize::{quoted_list, sanitize_sql_value};

/// Issue `i` to component `c` through the node association table.
/// `join` is `"JOIN"` or `"LEFT JOIN"`.
fn component_joins(join: &str) -> String {
    format!(
        "{join} {na_table} na ON i.ID = na.SOURCE_NODE_ID AND na.ASSOCIATION_TYPE = '{association}' \
         {join} {c_table} c ON na.SINK_NODE_ID = c.ID",
        join = join,
        na_table = NODE_ASSOCIATION_TABLE,
        association = ISSUE_COMPONENT_ASSOCIATION,
        c_table = COMPONENT_TABLE,
    )
}

/// `limit` bounds distinct issues: the CTE picks them, the outer join fans
/// them back out to one row per component.
pub fn list_issues_sql(request: &ListIssuesRequest) -> String {
    let predicates = build_predicates(&request.filters);
    format!(
        "WITH matched AS (\
         SELECT DISTINCT i.ID, i.CREATED FROM {issues} i {joins} {where_clause} \
         ORDER BY i.CREATED DESC LIMIT {limit}) \
         SELECT {select} FROM matched m JOIN {issues} i ON i.ID = m.ID {joins} \
         ORDER BY i.CREATED DESC, i.ID, c.CNAME",
        issues = ISSUE_TABLE,
        joins = component_joins("LEFT JOIN"),
        where_clause = where_clause(&predicates),
        limit = request.limit,
        select = issue::select_columns(DescriptionView::Truncated),
    )
}

pub fn issue_details_sql(keys: &[String]) -> String {
    format!(
        "SELECT {select} FROM {issues} i {joins} WHERE i.ISSUE_KEY IN ({keys}) ORDER BY i.ID, c.CNAME",
        select = issue::select_columns(DescriptionView::Full),
        issues = ISSUE_TABLE,
        joins = component_joins("LEFT JOIN"),
        keys = quoted_list(keys),
    )
}

pub fn project_summary_sql() -> String {
    format!(
        "SELECT PROJECT, ISSUESTATUS, PRIORITY, COUNT(*) AS ISSUE_COUNT FROM {} \
         GROUP BY PROJECT, ISSUESTATUS, PRIORITY ORDER BY PROJECT, ISSUESTATUS, PRIORITY",
        ISSUE_TABLE
    )
}

pub fn issue_id_sql(issue_key: &str) -> String {
    format!(
        "SELECT ID FROM {} WHERE ISSUE_KEY = '{}' LIMIT 1",
        ISSUE_TABLE,
        sanitize_sql_value(issue_key)
    )
}

pub fn list_components_sql(request: &ListComponentsRequest) -> String {
    let non_blank = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
    let mut predicates = Vec::new();

    if let Some(issue_key) = non_blank(&request.issue) {
        predicates.push(format!("i.ISSUE_KEY = '{}'", sanitize_sql_value(&issue_key)));
    }
    if let Some(project) = non_blank(&request.project) {
        predicates.push(format!("c.PROJECT = '{}'", sanitize_sql_value(&project)));
    }
    if let Some(archived) = non_blank(&request.archived) {
        predicates.push(format!("c.ARCHIVED = '{}'", sanitize_sql_value(&archived.to_uppercase())));
    }
    if let Some(deleted) = non_blank(&request.deleted) {
        predicates.push(format!("c.DELETED = '{}'", sanitize_sql_value(&deleted.to_uppercase())));
    }
    if let Some(search) = non_blank(&request.search_text) {
        let needle = sanitize_sql_value(&search.to_lowercase());
        predicates.push(format!(
            "(LOWER(c.CNAME) LIKE '%{needle}%' OR LOWER(c.DESCRIPTION) LIKE '%{needle}%')",
            needle = needle
        ));
    }

    format!(
        "SELECT DISTINCT {select} FROM {issues} i {joins} {where_clause} ORDER BY c.CNAME ASC LIMIT {limit}",
        select = component::select_columns(),
        issues = ISSUE_TABLE,
        joins = component_joins("JOIN"),
        where_clause = where_clause(&predicates),
        limit = request.limit,
    )
}

fn require(credential: Option<&Credential>) -> Result<&Credential, ServiceError> {
    credential.ok_or_else(|| {
        warn!("no warehouse credential, refusing to query");
        ServiceError::missing_credential()
    })
}

/// Issue reads: primary query, aggregation, then fail-soft enrichment.
pub struct IssueQueryService {
    executor: Arc<dyn QueryExecutor>,
}

impl IssueQueryService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    async fn enrich(&self, issues: &mut [Issue], credential: &Credential, relations: Relations) {
        let ids: Vec<String> = issues.iter().map(|issue| issue.id.to_string()).collect();
        EnrichmentOrchestrator::new(self.executor.as_ref(), credential)
            .fetch(&ids, relations)
            .await
            .merge_into(issues, relations);
    }

    #[instrument(skip(self, credential), fields(limit = request.limit))]
    pub async fn list_issues(
        &self,
        request: ListIssuesRequest,
        credential: Option<&Credential>,
    ) -> Result<IssueListResponse, ServiceError> {
        let credential = require(credential)?;

        let rows = self.executor.execute(&list_issues_sql(&request), credential).await?;
        let mut issues = aggregate(decode_rows(rows, IssueRow::from_row, ISSUE_TABLE));
        self.enrich(&mut issues, credential, Relations::LIST).await;

        info!(returned = issues.len(), "listed issues");
        Ok(IssueListResponse {
            total_returned: issues.len(),
            issues,
            filters_applied: request,
        })
    }

    #[instrument(skip(self, credential), fields(requested = issue_keys.len()))]
    pub async fn get_issue_details(
        &self,
        issue_keys: &[String],
        credential: Option<&Credential>,
    ) -> Result<IssueDetailsResponse, ServiceError> {
        let credential = require(credential)?;

        if issue_keys.is_empty() {
            return Ok(IssueDetailsResponse::empty());
        }

        let mut requested: Vec<String> = Vec::new();
        for key in issue_keys {
            if !requested.contains(key) {
                requested.push(key.clone());
            }
        }

        let rows = self
            .executor
            .execute(&issue_details_sql(&requested), credential)
            .await?;
        let mut issues = aggregate(decode_rows(rows, IssueRow::from_row, ISSUE_TABLE));
        self.enrich(&mut issues, credential, Relations::ALL).await;

        let found_issues: BTreeMap<String, Issue> = issues
            .into_iter()
            .map(|issue| (issue.key.clone(), issue))
            .collect();
        let not_found: Vec<String> = requested
            .into_iter()
            .filter(|key| !found_issues.contains_key(key))
            .collect();

        info!(found = found_issues.len(), missing = not_found.len(), "fetched issue details");
        Ok(IssueDetailsResponse {
            total_found: found_issues.len(),
            total_requested: issue_keys.len(),
            found_issues,
            not_found,
        })
    }

    #[instrument(skip_all)]
    pub async fn get_project_summary(
        &self,
        credential: Option<&Credential>,
    ) -> Result<ProjectSummaryResponse, ServiceError> {
        let credential = require(credential)?;

        let rows = self.executor.execute(&project_summary_sql(), credential).await?;

        let mut summary = ProjectSummaryResponse::default();
        for row in decode_rows(rows, ProjectCountRow::from_row, ISSUE_TABLE) {
            summary.record(row.project, row.status, row.priority, row.count);
        }

        info!(projects = summary.total_projects, issues = summary.total_issues, "built project summary");
        Ok(summary)
    }

    #[instrument(skip(self, credential))]
    pub async fn get_issue_links(
        &self,
        issue_key: &str,
        credential: Option<&Credential>,
    ) -> Result<IssueLinksResponse, ServiceError> {
        let credential = require(credential)?;
        let not_found = || ServiceError::NotFound(format!("Issue with key '{}' not found", issue_key));

        let rows = self.executor.execute(&issue_id_sql(issue_key), credential).await?;
        let row = rows.first().ok_or_else(not_found)?;
        let issue_id = issue::id_from_row(row).map_err(|e| {
            warn!(error = %e, "issue id lookup returned an unusable row");
            not_found()
        })?;
        let issue_id = issue_id.to_string();

        let links = EnrichmentOrchestrator::new(self.executor.as_ref(), credential)
            .fetch(std::slice::from_ref(&issue_id), Relations::LINKS_ONLY)
            .await
            .links
            .remove(&issue_id)
            .unwrap_or_default();

        info!(links = links.len(), "fetched issue links");
        Ok(IssueLinksResponse {
            issue_key: issue_key.to_string(),
            issue_id,
            total_links: links.len(),
            links,
        })
    }

    #[instrument(skip(self, credential), fields(limit = request.limit))]
    pub async fn list_components(
        &self,
        request: ListComponentsRequest,
        credential: Option<&Credential>,
    ) -> Result<ComponentListResponse, ServiceError> {
        let credential = require(credential)?;

        let rows = self
            .executor
            .execute(&list_components_sql(&request), credential)
            .await?;
        let components: Vec<_> = decode_rows(rows, ComponentRow::from_row, COMPONENT_TABLE)
            .into_iter()
            .map(ComponentRow::into_component)
            .collect();

        info!(returned = components.len(), "listed components");
        Ok(ComponentListResponse {
            total_returned: components.len(),
            components,
            filters_applied: request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::QueryError;
    use crate::entity::issue::tests::join_row;
    use crate::entity::link::tests::link_row;
    use crate::entity::{COMMENT_TABLE, LABEL_TABLE, LINK_TABLE};
    use crate::model::issue::IssueFilters;
    use crate::testing::{ScriptedExecutor, credential, row};

    fn service(executor: &Arc<ScriptedExecutor>) -> IssueQueryService {
        IssueQueryService::new(executor.clone())
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_every_operation() {
        let executor = Arc::new(ScriptedExecutor::new());
        let service = service(&executor);

        let err = service.list_issues(ListIssuesRequest::default(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
        assert!(service.get_issue_details(&["X-1".into()], None).await.is_err());
        assert!(service.get_project_summary(None).await.is_err());
        assert!(service.get_issue_links("X-1", None).await.is_err());
        assert!(service.list_components(ListComponentsRequest::default(), None).await.is_err());

        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn list_collapses_components_and_enriches_without_comments() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on(LABEL_TABLE, vec![row(&[Some("1"), Some("triage")])])
                .on(LINK_TABLE, vec![link_row("70", "2", "1")])
                .on(
                    "WITH matched",
                    vec![
                        join_row(Some("1"), "SMQE-1", Some("UI")),
                        join_row(Some("1"), "SMQE-1", Some("API")),
                        join_row(Some("2"), "SMQE-2", None),
                    ],
                ),
        );
        let request = ListIssuesRequest {
            filters: IssueFilters {
                project: Some("smqe".into()),
                created_days: 5,
                timeframe: 10,
                ..Default::default()
            },
            limit: 10,
        };

        let credential = credential();
        let response = service(&executor).list_issues(request.clone(), Some(&credential)).await.unwrap();

        assert_eq!(response.total_returned, 2);
        assert_eq!(response.filters_applied, request);

        let first = &response.issues[0];
        assert_eq!(first.key, "SMQE-1");
        assert_eq!(first.components, vec!["UI", "API"]);
        assert_eq!(first.labels, vec!["triage"]);
        assert_eq!(first.links.len(), 1);
        assert!(first.comments.is_none());

        let second = &response.issues[1];
        assert!(second.labels.is_empty());
        assert_eq!(second.links[0].related_issue_id, "1");

        assert!(executor.call_containing(COMMENT_TABLE).is_none());
        let sql = executor.call_containing("WITH matched").unwrap();
        assert!(sql.contains("WHERE i.PROJECT = 'SMQE' AND i.CREATED >= DATEADD(day, -5, CURRENT_TIMESTAMP())"));
        assert!(!sql.contains("-10"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("SUBSTRING(i.DESCRIPTION, 1, 500)"));
    }

    #[tokio::test]
    async fn list_query_failure_is_propagated() {
        let executor = Arc::new(ScriptedExecutor::new().fail("WITH matched", QueryError::Timeout));
        let credential = credential();

        let err = service(&executor)
            .list_issues(ListIssuesRequest::default(), Some(&credential))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::QueryExecution(QueryError::Timeout)));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn refused_token_is_reported_as_authentication_failure() {
        let executor = Arc::new(ScriptedExecutor::new().fail(
            "WITH matched",
            QueryError::Status { status: 401, body: "Invalid or expired token".into() },
        ));
        let credential = credential();

        let err = service(&executor)
            .list_issues(ListIssuesRequest::default(), Some(&credential))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
        assert_eq!(err.to_string(), "Authentication failed: Invalid or expired token");

        let executor = Arc::new(ScriptedExecutor::new().fail(
            "COUNT(*)",
            QueryError::Status { status: 403, body: "forbidden".into() },
        ));
        let err = service(&executor).get_project_summary(Some(&credential)).await.unwrap_err();
        let response = crate::model::global_error::AppError::from(err).to_response();
        assert_eq!(response.code, "AuthenticationFailed");
    }

    #[tokio::test]
    async fn details_report_missing_keys() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on(
                    COMMENT_TABLE,
                    vec![row(&[Some("c1"), Some("1"), None, Some("hello"), None, None])],
                )
                .on("i.ISSUE_KEY IN", vec![join_row(Some("1"), "X-1", None)]),
        );
        let credential = credential();

        let keys = vec!["X-1".to_string(), "X-2".to_string()];
        let response = service(&executor).get_issue_details(&keys, Some(&credential)).await.unwrap();

        assert_eq!(response.total_found, 1);
        assert_eq!(response.total_requested, 2);
        assert_eq!(response.not_found, vec!["X-2"]);
        let issue = &response.found_issues["X-1"];
        assert_eq!(issue.comments.as_ref().map(Vec::len), Some(1));

        let sql = executor.call_containing("i.ISSUE_KEY IN").unwrap();
        assert!(sql.contains("i.ISSUE_KEY IN ('X-1', 'X-2')"));
        assert!(!sql.contains("SUBSTRING"));
    }

    #[tokio::test]
    async fn keyless_rows_do_not_mask_missing_keys() {
        let mut keyless = join_row(Some("2"), "ignored", None);
        keyless[1] = None;
        let executor = Arc::new(
            ScriptedExecutor::new().on("i.ISSUE_KEY IN", vec![join_row(Some("1"), "X-1", None), keyless]),
        );
        let credential = credential();

        let keys = vec!["X-1".to_string(), "X-2".to_string()];
        let response = service(&executor).get_issue_details(&keys, Some(&credential)).await.unwrap();

        assert_eq!(response.total_found, 1);
        assert!(!response.found_issues.contains_key(""));
        assert_eq!(response.not_found, vec!["X-2"]);
    }

    #[tokio::test]
    async fn details_deduplicate_not_found_in_request_order() {
        let executor = Arc::new(ScriptedExecutor::new());
        let credential = credential();

        let keys: Vec<String> = ["B-2", "A-1", "B-2"].iter().map(|k| k.to_string()).collect();
        let response = service(&executor).get_issue_details(&keys, Some(&credential)).await.unwrap();

        assert_eq!(response.not_found, vec!["B-2", "A-1"]);
        assert_eq!(response.total_requested, 3);
        assert_eq!(response.total_found, 0);
    }

    #[tokio::test]
    async fn empty_details_request_skips_the_warehouse() {
        let executor = Arc::new(ScriptedExecutor::new());
        let credential = credential();

        let response = service(&executor).get_issue_details(&[], Some(&credential)).await.unwrap();
        assert!(response.found_issues.is_empty());
        assert_eq!(response.total_requested, 0);
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn summary_folds_counts() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "GROUP BY",
            vec![
                row(&[Some("P1"), Some("Open"), Some("High"), Some("3")]),
                row(&[Some("P1"), Some("Closed"), Some("Low"), Some("2")]),
            ],
        ));
        let credential = credential();

        let summary = service(&executor).get_project_summary(Some(&credential)).await.unwrap();
        assert_eq!(summary.total_issues, 5);
        assert_eq!(summary.total_projects, 1);

        let p1 = &summary.projects["P1"];
        assert_eq!(p1.total_issues, 5);
        assert_eq!(p1.statuses["Open"], 3);
        assert_eq!(p1.statuses["Closed"], 2);
        assert_eq!(p1.priorities["High"], 3);
        assert_eq!(p1.priorities["Low"], 2);
    }

    #[tokio::test]
    async fn links_for_unknown_key_is_not_found() {
        let executor = Arc::new(ScriptedExecutor::new());
        let credential = credential();

        let err = service(&executor)
            .get_issue_links("NOPE-1", Some(&credential))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Issue with key 'NOPE-1' not found"));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn links_resolve_key_then_look_up_by_id() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on("SELECT ID FROM", vec![row(&[Some("42")])])
                .on(LINK_TABLE, vec![link_row("1", "42", "43"), link_row("2", "44", "42")]),
        );
        let credential = credential();

        let response = service(&executor).get_issue_links("O'K-42", Some(&credential)).await.unwrap();
        assert_eq!(response.issue_key, "O'K-42");
        assert_eq!(response.issue_id, "42");
        assert_eq!(response.total_links, 2);

        let lookup = executor.call_containing("SELECT ID FROM").unwrap();
        assert!(lookup.contains("ISSUE_KEY = 'O''K-42'"));
        assert!(executor.call_containing(LABEL_TABLE).is_none());
    }

    #[tokio::test]
    async fn link_lookup_failure_degrades_to_no_links() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on("SELECT ID FROM", vec![row(&[Some("42")])])
                .fail(LINK_TABLE, QueryError::Timeout),
        );
        let credential = credential();

        let response = service(&executor).get_issue_links("K-42", Some(&credential)).await.unwrap();
        assert!(response.links.is_empty());
        assert_eq!(response.total_links, 0);
    }

    #[tokio::test]
    async fn components_apply_filters() {
        let mut component = vec![None; component::COLUMNS.len()];
        component[0] = Some("10".to_string());
        component[2] = Some("Frontend".to_string());
        let executor = Arc::new(ScriptedExecutor::new().on(COMPONENT_TABLE, vec![component]));
        let credential = credential();

        let request = ListComponentsRequest {
            archived: Some("n".into()),
            issue: Some("SMQE-1".into()),
            search_text: Some("Front".into()),
            limit: 5,
            ..Default::default()
        };
        let response = service(&executor)
            .list_components(request.clone(), Some(&credential))
            .await
            .unwrap();

        assert_eq!(response.total_returned, 1);
        assert_eq!(response.components[0].name.as_deref(), Some("Frontend"));
        assert_eq!(response.filters_applied, request);

        let sql = executor.call_containing(COMPONENT_TABLE).unwrap();
        assert!(sql.contains("i.ISSUE_KEY = 'SMQE-1' AND c.ARCHIVED = 'N'"));
        assert!(sql.contains("LOWER(c.CNAME) LIKE '%front%'"));
        assert!(sql.contains("JOIN JIRA_NODEASSOCIATION_RHAI na ON i.ID = na.SOURCE_NODE_ID AND na.ASSOCIATION_TYPE = 'IssueComponent'"));
        assert!(sql.ends_with("ORDER BY c.CNAME ASC LIMIT 5"));
    }
}
