//! Folds one-to-many join rows into one record per entity.

use std::collections::HashMap;
use tracing::warn;

use crate::db::Row;
use crate::entity::RowError;
use crate::entity::issue::IssueRow;
use crate::model::issue::Issue;

/// Delimiter between values packed into one multi-valued cell.
pub const VALUE_SEPARATOR: &str = "||";

/// A join row that repeats its entity's scalar columns next to one slice of
/// a multi-valued column.
pub trait FanOutRow {
    type Record: MultiValued;

    fn entity_id(&self) -> i64;
    fn joined_values(&self) -> Option<&str>;
    /// Builds the record from the scalar columns of the entity's first row.
    fn materialize(self) -> Self::Record;
}

pub trait MultiValued {
    fn values_mut(&mut self) -> &mut Vec<String>;
}

impl FanOutRow for IssueRow {
    type Record = Issue;

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn joined_values(&self) -> Option<&str> {
        self.components.as_deref()
    }

    fn materialize(self) -> Issue {
        self.into_issue()
    }
}

impl MultiValued for Issue {
    fn values_mut(&mut self) -> &mut Vec<String> {
        &mut self.components
    }
}

/// Splits on `||`, trims, drops empties.
pub fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Records in first-seen id order, each with its distinct values in
/// first-seen order.
pub fn aggregate<R: FanOutRow>(rows: impl IntoIterator<Item = R>) -> Vec<R::Record> {
    let mut records: Vec<R::Record> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let id = row.entity_id();
        let joined = row.joined_values().map(str::to_string);

        let position = match positions.get(&id) {
            Some(&position) => position,
            None => {
                records.push(row.materialize());
                positions.insert(id, records.len() - 1);
                records.len() - 1
            }
        };

        if let Some(joined) = joined {
            let values = records[position].values_mut();
            for value in split_values(&joined) {
                if !values.iter().any(|existing| existing == value) {
                    values.push(value.to_string());
                }
            }
        }
    }

    records
}

/// Decodes every row with `decode`, logging and skipping the ones that do not fit.
pub fn decode_rows<T>(
    rows: Vec<Row>,
    decode: impl Fn(&[Option<String>]) -> Result<T, RowError>,
    table: &'static str,
) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match decode(row.as_slice()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(table, index, error = %e, "skipping malformed row");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(table, skipped = total - decoded.len(), total, "dropped malformed rows");
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::issue::tests::join_row;

    #[derive(Debug)]
    struct Pair(i64, Option<&'static str>);

    #[derive(Debug, PartialEq)]
    struct Tagged {
        id: i64,
        tags: Vec<String>,
    }

    impl MultiValued for Tagged {
        fn values_mut(&mut self) -> &mut Vec<String> {
            &mut self.tags
        }
    }

    impl FanOutRow for Pair {
        type Record = Tagged;

        fn entity_id(&self) -> i64 {
            self.0
        }

        fn joined_values(&self) -> Option<&str> {
            self.1
        }

        fn materialize(self) -> Tagged {
            Tagged {
                id: self.0,
                tags: Vec::new(),
            }
        }
    }

    #[test]
    fn merges_values_without_duplicates() {
        let records = aggregate(vec![Pair(1, Some("A||B")), Pair(1, Some("B||C")), Pair(2, Some(""))]);
        assert_eq!(
            records,
            vec![
                Tagged {
                    id: 1,
                    tags: vec!["A".into(), "B".into(), "C".into()]
                },
                Tagged { id: 2, tags: vec![] },
            ]
        );
    }

    #[test]
    fn keeps_first_seen_order_across_interleaving() {
        let records = aggregate(vec![
            Pair(3, Some("x")),
            Pair(1, None),
            Pair(3, Some(" y || x ||")),
            Pair(2, Some("z")),
            Pair(1, Some("w")),
        ]);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(records[0].tags, vec!["x", "y"]);
        assert_eq!(records[1].tags, vec!["w"]);
    }

    #[test]
    fn split_values_trims_and_drops_empties() {
        assert_eq!(split_values(" A || ||B||").collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(split_values("").count(), 0);
    }

    #[test]
    fn issue_rows_collapse_to_issues() {
        let rows = vec![
            join_row(Some("1"), "P-1", Some("UI")),
            join_row(Some("1"), "P-1", Some("API")),
            join_row(Some("2"), "P-2", None),
            join_row(Some("1"), "P-1", Some("UI")),
        ];
        let decoded = decode_rows(rows, IssueRow::from_row, "issues");
        let issues = aggregate(decoded);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].key, "P-1");
        assert_eq!(issues[0].components, vec!["UI", "API"]);
        assert_eq!(issues[1].key, "P-2");
        assert!(issues[1].components.is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let rows = vec![
            join_row(None, "P-0", Some("UI")),
            join_row(Some("abc"), "P-9", None),
            vec![Some("1".to_string())],
            join_row(Some("4"), "P-4", None),
        ];
        let decoded = decode_rows(rows, IssueRow::from_row, "issues");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, 4);
    }
}
