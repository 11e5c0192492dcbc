use super::{RowError, check_width, text};
use crate::model::component::Component;
use crate::util::timestamp::normalize_timestamp;

pub const COLUMNS: &[&str] = &[
    "ID",
    "PROJECT",
    "COMPONENT_NAME",
    "DESCRIPTION",
    "URL",
    "LEAD",
    "ASSIGNEETYPE",
    "ARCHIVED",
    "DELETED",
    "_FIVETRAN_SYNCED",
];

/// SELECT list matching [`COLUMNS`] against the component table aliased `c`.
pub fn select_columns() -> String {
    COLUMNS
        .iter()
        .map(|column| match *column {
            "COMPONENT_NAME" => "c.CNAME AS COMPONENT_NAME".to_string(),
            other => format!("c.{}", other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRow {
    pub id: Option<String>,
    pub project: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub lead: Option<String>,
    pub assignee_type: Option<String>,
    pub archived: Option<String>,
    pub deleted: Option<String>,
    pub synced: Option<String>,
}

impl ComponentRow {
    pub fn from_row(row: &[Option<String>]) -> Result<Self, RowError> {
        check_width(row, COLUMNS)?;

        Ok(Self {
            id: text(row, 0),
            project: text(row, 1),
            name: text(row, 2),
            description: text(row, 3),
            url: text(row, 4),
            lead: text(row, 5),
            assignee_type: text(row, 6),
            archived: text(row, 7),
            deleted: text(row, 8),
            synced: normalize_timestamp(text(row, 9)),
        })
    }

    pub fn into_component(self) -> Component {
        Component {
            id: self.id,
            project: self.project,
            name: self.name,
            description: self.description.unwrap_or_default(),
            url: self.url,
            lead: self.lead,
            assignee_type: self.assignee_type,
            archived: self.archived,
            deleted: self.deleted,
            synced: self.synced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_renames_cname() {
        let select = select_columns();
        assert!(select.starts_with("c.ID, c.PROJECT, c.CNAME AS COMPONENT_NAME, c.DESCRIPTION"));
        assert!(select.ends_with("c._FIVETRAN_SYNCED"));
    }

    #[test]
    fn null_description_becomes_empty() {
        let mut row: Vec<Option<String>> = vec![None; COLUMNS.len()];
        row[0] = Some("10".to_string());
        row[2] = Some("UI".to_string());
        row[7] = Some("N".to_string());

        let component = ComponentRow::from_row(&row).unwrap().into_component();
        assert_eq!(component.id.as_deref(), Some("10"));
        assert_eq!(component.name.as_deref(), Some("UI"));
        assert_eq!(component.description, "");
        assert_eq!(component.archived.as_deref(), Some("N"));
    }
}
