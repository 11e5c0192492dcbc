use super::{RowError, check_width, entity_id, integer, text};
use crate::model::issue::{Link, LinkDirection};

/// Link joined with its type and both endpoint issues.
pub const COLUMNS: &[&str] = &[
    "LINK_ID",
    "SOURCE",
    "DESTINATION",
    "SEQUENCE",
    "LINKNAME",
    "INWARD",
    "OUTWARD",
    "SOURCE_KEY",
    "DESTINATION_KEY",
    "SOURCE_SUMMARY",
    "DESTINATION_SUMMARY",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub link_id: Option<String>,
    pub source: i64,
    pub destination: i64,
    pub sequence: Option<i64>,
    pub link_name: Option<String>,
    pub inward: Option<String>,
    pub outward: Option<String>,
    pub source_key: Option<String>,
    pub destination_key: Option<String>,
    pub source_summary: Option<String>,
    pub destination_summary: Option<String>,
}

impl LinkRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        Ok(Self {
            link_id: text(row, 0),
            source: entity_id(row, 1, "SOURCE")?,
            destination: entity_id(row, 2, "DESTINATION")?,
            sequence: integer(row, 3),
            link_name: text(row, 4),
            inward: text(row, 5),
            outward: text(row, 6),
            source_key: text(row, 7),
            destination_key: text(row, 8),
            source_summary: text(row, 9),
            destination_summary: text(row, 10),
        })
    }

    /// The link as seen from `issue_id`, or `None` if that issue is not an endpoint.
    pub fn view_from(&self, issue_id: i64) -> Option<Link> {
        let (relationship, description, related_id, related_key, related_summary) = if issue_id == self.source {
            (
                LinkDirection::Outward,
                &self.outward,
                self.destination,
                &self.destination_key,
                &self.destination_summary,
            )
        } else if issue_id == self.destination {
            (
                LinkDirection::Inward,
                &self.inward,
                self.source,
                &self.source_key,
                &self.source_summary,
            )
        } else {
            return None;
        };

        Some(Link {
            link_id: self.link_id.clone(),
            relationship,
            link_type: self.link_name.clone(),
            description: description.clone(),
            related_issue_id: related_id.to_string(),
            related_issue_key: related_key.clone(),
            related_issue_summary: related_summary.clone(),
            sequence: self.sequence,
        })
    }
}
