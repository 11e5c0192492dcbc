//! Positional row layouts for the warehouse tables.
//!
//! Each row type declares its column order once and is decoded from a
//! [`Row`](crate::db::Row) by position. A width mismatch is an error.

pub mod comment;
pub mod component;
pub mod issue;
pub mod label;
pub mod link;
pub mod project_count;

use thiserror::Error;

pub const ISSUE_TABLE: &str = "JIRA_ISSUE_NON_PII";
pub const LABEL_TABLE: &str = "JIRA_LABEL_RHAI";
pub const COMMENT_TABLE: &str = "JIRA_COMMENT_NON_PII";
pub const LINK_TABLE: &str = "JIRA_ISSUELINK_RHAI";
pub const LINK_TYPE_TABLE: &str = "JIRA_ISSUELINKTYPE_RHAI";
pub const NODE_ASSOCIATION_TABLE: &str = "JIRA_NODEASSOCIATION_RHAI";
pub const COMPONENT_TABLE: &str = "JIRA_COMPONENT_RHAI";

/// Association type linking an issue (source node) to a component (sink node).
pub const ISSUE_COMPONENT_ASSOCIATION: &str = "IssueComponent";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("expected {expected} columns, got {actual}")]
    Width { expected: usize, actual: usize },
    #[error("{0} is null")]
    Null(&'static str),
    #[error("{column} is not numeric: {value}")]
    NotNumeric { column: &'static str, value: String },
}

pub(crate) fn check_width(row: &[Option<String>], columns: &[&str]) -> Result<(), RowError> {
    if row.len() == columns.len() {
        Ok(())
    } else {
        Err(RowError::Width {
            expected: columns.len(),
            actual: row.len(),
        })
    }
}

pub(crate) fn text(row: &[Option<String>], index: usize) -> Option<String> {
    row.get(index).cloned().flatten()
}

pub(crate) fn required_text(row: &[Option<String>], index: usize, column: &'static str) -> Result<String, RowError> {
    text(row, index)
        .filter(|value| !value.trim().is_empty())
        .ok_or(RowError::Null(column))
}

/// Lenient integer cell: `"12"` and `"12.000"` both read as 12, junk as `None`.
pub(crate) fn integer(row: &[Option<String>], index: usize) -> Option<i64> {
    let raw = row.get(index)?.as_deref()?.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// Warehouse-assigned id: required, digits only.
pub(crate) fn entity_id(row: &[Option<String>], index: usize, column: &'static str) -> Result<i64, RowError> {
    let raw = row
        .get(index)
        .and_then(|cell| cell.as_deref())
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(RowError::Null(column))?;

    raw.parse::<i64>().map_err(|_| RowError::NotNumeric {
        column,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn integer_cells_are_lenient() {
        let row = cells(&[Some("12"), Some("12.000"), Some("n/a"), None]);
        assert_eq!(integer(&row, 0), Some(12));
        assert_eq!(integer(&row, 1), Some(12));
        assert_eq!(integer(&row, 2), None);
        assert_eq!(integer(&row, 3), None);
        assert_eq!(integer(&row, 9), None);
    }

    #[test]
    fn entity_ids_must_be_present_and_numeric() {
        let row = cells(&[Some("42"), None, Some(""), Some("abc")]);
        assert_eq!(entity_id(&row, 0, "ID"), Ok(42));
        assert_eq!(entity_id(&row, 1, "ID"), Err(RowError::Null("ID")));
        assert_eq!(entity_id(&row, 2, "ID"), Err(RowError::Null("ID")));
        assert!(matches!(entity_id(&row, 3, "ID"), Err(RowError::NotNumeric { .. })));
    }

    #[test]
    fn width_mismatch_is_reported() {
        let row = cells(&[Some("1")]);
        assert_eq!(
            check_width(&row, &["A", "B"]),
            Err(RowError::Width { expected: 2, actual: 1 })
        );
    }
}
