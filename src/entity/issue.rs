use super::{RowError, check_width, entity_id, integer, required_text, text};
use crate::model::issue::Issue;
use crate::util::timestamp::normalize_timestamp;

/// Column order of the issue × component join. Every column but the last
/// comes from the issue table (`i`); the last is the joined component name (`c`).
pub const COLUMNS: &[&str] = &[
    "ID",
    "ISSUE_KEY",
    "PROJECT",
    "ISSUENUM",
    "ISSUETYPE",
    "SUMMARY",
    "DESCRIPTION",
    "PRIORITY",
    "ISSUESTATUS",
    "RESOLUTION",
    "CREATED",
    "UPDATED",
    "DUEDATE",
    "RESOLUTIONDATE",
    "VOTES",
    "WATCHES",
    "ENVIRONMENT",
    "FIXFOR",
    "TIMEORIGINALESTIMATE",
    "TIMEESTIMATE",
    "TIMESPENT",
    "WORKFLOW_ID",
    "SECURITY",
    "ARCHIVED",
    "ARCHIVEDDATE",
    "COMPONENT_NAME",
];

const COMPONENT_INDEX: usize = COLUMNS.len() - 1;

/// List responses carry at most this many description characters.
pub const LIST_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionView {
    Truncated,
    Full,
}

/// SELECT list matching [`COLUMNS`], with `i` aliasing the issue table and
/// `c` the component table.
pub fn select_columns(view: DescriptionView) -> String {
    COLUMNS[..COMPONENT_INDEX]
        .iter()
        .map(|column| match (*column, view) {
            ("DESCRIPTION", DescriptionView::Truncated) => format!(
                "SUBSTRING(i.DESCRIPTION, 1, {}) AS DESCRIPTION",
                LIST_DESCRIPTION_CHARS
            ),
            _ => format!("i.{}", column),
        })
        .chain(std::iter::once(format!("c.CNAME AS {}", COLUMNS[COMPONENT_INDEX])))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One row of the issue × component join.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRow {
    pub id: i64,
    pub key: String,
    pub project: Option<String>,
    pub issue_number: Option<i64>,
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
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
    /// `||`-delimited component names; a plain join row carries just one.
    pub components: Option<String>,
}

impl IssueRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        Ok(Self {
            id: entity_id(row, 0, "ID")?,
            key: required_text(row, 1, "ISSUE_KEY")?,
            project: text(row, 2),
            issue_number: integer(row, 3),
            issue_type: text(row, 4),
            summary: text(row, 5),
            description: text(row, 6),
            priority: text(row, 7),
            status: text(row, 8),
            resolution: text(row, 9),
            created: normalize_timestamp(text(row, 10)),
            updated: normalize_timestamp(text(row, 11)),
            due_date: normalize_timestamp(text(row, 12)),
            resolution_date: normalize_timestamp(text(row, 13)),
            votes: integer(row, 14),
            watches: integer(row, 15),
            environment: text(row, 16),
            fix_version: text(row, 17),
            time_original_estimate: integer(row, 18),
            time_estimate: integer(row, 19),
            time_spent: integer(row, 20),
            workflow_id: text(row, 21),
            security: text(row, 22),
            archived: text(row, 23),
            archived_date: normalize_timestamp(text(row, 24)),
            components: text(row, COMPONENT_INDEX),
        })
    }

    /// Scalar fields only; relations start empty and are filled by aggregation
    /// and enrichment.
    pub fn into_issue(self) -> Issue {
        Issue {
            id: self.id,
            key: self.key,
            project: self.project,
            issue_number: self.issue_number,
            issue_type: self.issue_type,
            summary: self.summary,
            description: self.description.unwrap_or_default(),
            priority: self.priority,
            status: self.status,
            resolution: self.resolution,
            created: self.created,
            updated: self.updated,
            due_date: self.due_date,
            resolution_date: self.resolution_date,
            votes: self.votes,
            watches: self.watches,
            environment: self.environment,
            fix_version: self.fix_version,
            time_original_estimate: self.time_original_estimate,
            time_estimate: self.time_estimate,
            time_spent: self.time_spent,
            workflow_id: self.workflow_id,
            security: self.security,
            archived: self.archived,
            archived_date: self.archived_date,
            components: Vec::new(),
            labels: Vec::new(),
            comments: None,
            links: Vec::new(),
        }
    }
}

/// Point lookup row: `SELECT ID FROM issues WHERE ISSUE_KEY = ...`.
pub fn id_from_row(row: &[Option<String>]) -> Result<i64, RowError> {
    check_width(row, &["ID"])?;
    entity_id(row, 0, "ID")
}
