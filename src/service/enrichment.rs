//! Concurrent label / comment / link lookups keyed by issue id.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{debug, instrument, warn};

use crate::auth::Credential;
use crate::db::{QueryError, QueryExecutor};
use crate::entity::comment::CommentRow;
use crate::entity::label::LabelRow;
use crate::entity::link::LinkRow;
use crate::entity::{COMMENT_TABLE, ISSUE_TABLE, LABEL_TABLE, LINK_TABLE, LINK_TYPE_TABLE};
use crate::model::issue::{Comment, Issue, Link};
use crate::service::aggregate::decode_rows;
use crate::service::sanitize::{numeric_ids, quoted_list};

/// Which relations to look up. Disabled ones resolve to empty without a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relations {
    pub labels: bool,
    pub comments: bool,
    pub links: bool,
}

impl Relations {
    pub const ALL: Relations = Relations {
        labels: true,
        comments: true,
        links: true,
    };

    /// List view: no comments.
    pub const LIST: Relations = Relations {
        labels: true,
        comments: false,
        links: true,
    };

    pub const LINKS_ONLY: Relations = Relations {
        labels: false,
        comments: false,
        links: true,
    };
}

/// Relation mappings keyed by stringified issue id.
#[derive(Debug, Default)]
pub struct Enrichment {
    pub labels: HashMap<String, Vec<String>>,
    pub comments: HashMap<String, Vec<Comment>>,
    pub links: HashMap<String, Vec<Link>>,
}

impl Enrichment {
    /// Attaches every mapping to its issue; issues without entries get empty lists.
    /// Comments are attached only when `relations.comments` is set.
    pub fn merge_into(mut self, issues: &mut [Issue], relations: Relations) {
        for issue in issues.iter_mut() {
            let id = issue.id.to_string();
            issue.labels = self.labels.remove(&id).unwrap_or_default();
            issue.links = self.links.remove(&id).unwrap_or_default();
            if relations.comments {
                issue.comments = Some(self.comments.remove(&id).unwrap_or_default());
            }
        }
    }
}

pub struct EnrichmentOrchestrator<'a> {
    executor: &'a dyn QueryExecutor,
    credential: &'a Credential,
}

pub fn labels_sql(ids: &[String]) -> String {
    format!(
        "SELECT ISSUE, LABEL FROM {} WHERE ISSUE IN ({}) AND LABEL IS NOT NULL",
        LABEL_TABLE,
        quoted_list(ids)
    )
}

pub fn comments_sql(ids: &[String]) -> String {
    format!(
        "SELECT ID, ISSUEID, ROLELEVEL, BODY, CREATED, UPDATED FROM {} \
         WHERE ISSUEID IN ({}) AND BODY IS NOT NULL ORDER BY ISSUEID, CREATED ASC",
        COMMENT_TABLE,
        quoted_list(ids)
    )
}

pub fn links_sql(ids: &[String]) -> String {
    let ids = quoted_list(ids);
    format!(
        "SELECT l.ID AS LINK_ID, l.SOURCE, l.DESTINATION, l.SEQUENCE, lt.LINKNAME, lt.INWARD, lt.OUTWARD, \
         si.ISSUE_KEY AS SOURCE_KEY, di.ISSUE_KEY AS DESTINATION_KEY, \
         si.SUMMARY AS SOURCE_SUMMARY, di.SUMMARY AS DESTINATION_SUMMARY \
         FROM {links} l \
         LEFT JOIN {types} lt ON l.LINKTYPE = lt.ID \
         LEFT JOIN {issues} si ON l.SOURCE = si.ID \
         LEFT JOIN {issues} di ON l.DESTINATION = di.ID \
         WHERE l.SOURCE IN ({ids}) OR l.DESTINATION IN ({ids}) \
         ORDER BY l.SEQUENCE, l.ID",
        links = LINK_TABLE,
        types = LINK_TYPE_TABLE,
        issues = ISSUE_TABLE,
        ids = ids,
    )
}

/// Awaits a lookup, degrading a failure to an empty mapping.
async fn fail_soft<T: Default>(relation: &'static str, lookup: impl Future<Output = Result<T, QueryError>>) -> T {
    match lookup.await {
        Ok(mapping) => mapping,
        Err(e) => {
            warn!(relation, error = %e, "enrichment lookup failed, continuing without it");
            T::default()
        }
    }
}

impl<'a> EnrichmentOrchestrator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor, credential: &'a Credential) -> Self {
        Self { executor, credential }
    }

    /// Runs the enabled lookups concurrently and waits for all of them.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn fetch(&self, ids: &[String], relations: Relations) -> Enrichment {
        let ids = numeric_ids(ids);
        if ids.is_empty() {
            debug!("no valid issue ids, skipping enrichment");
            return Enrichment::default();
        }

        let labels = async {
            if relations.labels {
                fail_soft("labels", self.labels(&ids)).await
            } else {
                HashMap::new()
            }
        };
        let comments = async {
            if relations.comments {
                fail_soft("comments", self.comments(&ids)).await
            } else {
                HashMap::new()
            }
        };
        let links = async {
            if relations.links {
                fail_soft("links", self.links(&ids)).await
            } else {
                HashMap::new()
            }
        };

        let (labels, comments, links) = tokio::join!(labels, comments, links);
        Enrichment { labels, comments, links }
    }

    async fn labels(&self, ids: &[String]) -> Result<HashMap<String, Vec<String>>, QueryError> {
        let rows = self.executor.execute(&labels_sql(ids), self.credential).await?;

        let mut mapping: HashMap<String, Vec<String>> = HashMap::new();
        for row in decode_rows(rows, LabelRow::from_row, LABEL_TABLE) {
            if let Some(label) = row.label.filter(|label| !label.is_empty()) {
                mapping.entry(row.issue_id.to_string()).or_default().push(label);
            }
        }
        Ok(mapping)
    }

    async fn comments(&self, ids: &[String]) -> Result<HashMap<String, Vec<Comment>>, QueryError> {
        let rows = self.executor.execute(&comments_sql(ids), self.credential).await?;

        let mut mapping: HashMap<String, Vec<Comment>> = HashMap::new();
        for row in decode_rows(rows, CommentRow::from_row, COMMENT_TABLE) {
            mapping
                .entry(row.issue_id.to_string())
                .or_default()
                .push(row.into_comment());
        }
        Ok(mapping)
    }

    /// A link between two requested issues is listed under both.
    async fn links(&self, ids: &[String]) -> Result<HashMap<String, Vec<Link>>, QueryError> {
        let rows = self.executor.execute(&links_sql(ids), self.credential).await?;
        let requested: HashSet<i64> = ids.iter().filter_map(|id| id.parse().ok()).collect();

        let mut mapping: HashMap<String, Vec<Link>> = HashMap::new();
        for row in decode_rows(rows, LinkRow::from_row, LINK_TABLE) {
            let mut endpoints = vec![row.source];
            if row.destination != row.source {
                endpoints.push(row.destination);
            }

            for endpoint in endpoints.into_iter().filter(|id| requested.contains(id)) {
                if let Some(link) = row.view_from(endpoint) {
                    mapping.entry(endpoint.to_string()).or_default().push(link);
                }
            }
        }
        Ok(mapping)
    }
}
