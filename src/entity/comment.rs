use super::{RowError, check_width, entity_id, text};
use crate::model::issue::Comment;
use crate::util::timestamp::normalize_timestamp;

pub const COLUMNS: &[&str] = &["ID", "ISSUEID", "ROLELEVEL", "BODY", "CREATED", "UPDATED"];

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub id: Option<String>,
    pub issue_id: i64,
    pub role_level: Option<String>,
    pub body: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl CommentRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        Ok(Self {
            id: text(row, 0),
            issue_id: entity_id(row, 1, "ISSUEID")?,
            role_level: text(row, 2),
            body: text(row, 3),
            created: normalize_timestamp(text(row, 4)),
            updated: normalize_timestamp(text(row, 5)),
        })
    }

    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            role_level: self.role_level,
            body: self.body,
            created: self.created,
            updated: self.updated,
        }
    }
}
