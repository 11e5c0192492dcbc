use super::{RowError, check_width, integer, text};

pub const COLUMNS: &[&str] = &["PROJECT", "ISSUESTATUS", "PRIORITY", "ISSUE_COUNT"];

pub const UNKNOWN: &str = "Unknown";

/// One `GROUP BY PROJECT, ISSUESTATUS, PRIORITY` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCountRow {
    pub project: String,
    pub status: String,
    pub priority: String,
    pub count: u64,
}

impl ProjectCountRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        let or_unknown = |index| text(row, index).unwrap_or_else(|| UNKNOWN.to_string());

        Ok(Self {
            project: or_unknown(0),
            status: or_unknown(1),
            priority: or_unknown(2),
            count: integer(row, 3).and_then(|n| u64::try_from(n).ok()).unwrap_or(0),
        })
    }
}
