use tracing::debug;

/// Escapes a value for a single-quoted SQL literal by doubling `'`.
pub fn sanitize_sql_value<T: ToString + ?Sized>(value: &T) -> String {
    value.to_string().replace('\'', "''")
}

/// `'v1', 'v2'` list for an IN clause.
pub fn quoted_list<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| format!("'{}'", sanitize_sql_value(value.as_ref())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keeps ids made only of ASCII digits, deduplicated in first-seen order.
/// Anything else is dropped, never escaped.
pub fn numeric_ids<I, T>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut kept: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            debug!(id, "dropping non-numeric issue id");
            continue;
        }
        if !kept.iter().any(|k| k == id) {
            kept.push(id.to_string());
        }
    }
    kept
}
