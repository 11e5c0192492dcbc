use super::{RowError, check_width, entity_id, text};

pub const COLUMNS: &[&str] = &["ISSUE", "LABEL"];

#[derive(Debug, Clone, PartialEq)]
pub struct LabelRow {
    pub issue_id: i64,
    pub label: Option<String>,
}

impl LabelRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        Ok(Self {
            issue_id: entity_id(row, 0, "ISSUE")?,
            label: text(row, 1),
        })
    }
}
