//! Filter arguments to SQL boolean fragments.
//!
//! Columns are qualified with `i` (issue table) and `c` (component table).

use crate::model::issue::IssueFilters;
use crate::service::sanitize::sanitize_sql_value;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn equality(column: &str, value: &str) -> String {
    format!("{} = '{}'", column, sanitize_sql_value(value))
}

fn within_days(column: &str, days: i64) -> String {
    format!("{} >= DATEADD(day, -{}, CURRENT_TIMESTAMP())", column, days)
}

fn contains_lower(column: &str, needle: &str) -> String {
    format!("LOWER({}) LIKE '%{}%'", column, sanitize_sql_value(needle))
}

/// Lower-cased, trimmed, non-empty comma-separated terms.
pub fn component_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Date windows. Any of the specific windows suppresses `timeframe`.
fn date_fragments(filters: &IssueFilters) -> Vec<String> {
    let specific: Vec<String> = [
        ("i.CREATED", filters.created_days),
        ("i.UPDATED", filters.updated_days),
        ("i.RESOLUTIONDATE", filters.resolved_days),
    ]
    .into_iter()
    .filter(|(_, days)| *days > 0)
    .map(|(column, days)| within_days(column, days))
    .collect();

    if !specific.is_empty() {
        return specific;
    }

    if filters.timeframe > 0 {
        return vec![format!(
            "({} OR {} OR {})",
            within_days("i.CREATED", filters.timeframe),
            within_days("i.UPDATED", filters.timeframe),
            within_days("i.RESOLUTIONDATE", filters.timeframe),
        )];
    }

    Vec::new()
}

/// Ordered fragments: project, issue_type, status, priority, search_text,
/// components, dates.
pub fn build_predicates(filters: &IssueFilters) -> Vec<String> {
    let mut fragments = Vec::new();

    if let Some(project) = non_blank(&filters.project) {
        fragments.push(equality("i.PROJECT", &project.to_uppercase()));
    }
    if let Some(issue_type) = non_blank(&filters.issue_type) {
        fragments.push(equality("i.ISSUETYPE", issue_type));
    }
    if let Some(status) = non_blank(&filters.status) {
        fragments.push(equality("i.ISSUESTATUS", status));
    }
    if let Some(priority) = non_blank(&filters.priority) {
        fragments.push(equality("i.PRIORITY", priority));
    }

    if let Some(search) = non_blank(&filters.search_text) {
        let needle = search.to_lowercase();
        fragments.push(format!(
            "({} OR {})",
            contains_lower("i.SUMMARY", &needle),
            contains_lower("i.DESCRIPTION", &needle)
        ));
    }

    if let Some(raw) = non_blank(&filters.components) {
        let terms: Vec<String> = component_terms(raw)
            .iter()
            .map(|term| {
                format!(
                    "({} OR {})",
                    contains_lower("c.CNAME", term),
                    contains_lower("c.DESCRIPTION", term)
                )
            })
            .collect();
        if !terms.is_empty() {
            fragments.push(format!("({})", terms.join(" OR ")));
        }
    }

    fragments.extend(date_fragments(filters));
    fragments
}

/// `WHERE a AND b`, or an empty string when nothing applies.
pub fn where_clause(fragments: &[String]) -> String {
    if fragments.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", fragments.join(" AND "))
    }
}
