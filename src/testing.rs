//! In-memory [`QueryExecutor`] double for service and tool tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::auth::Credential;
use crate::db::{QueryError, QueryExecutor, Row};

/// Answers each statement with the first rule whose pattern it contains,
/// or with no rows. Every statement is recorded.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    rules: Vec<(String, Result<Vec<Row>, QueryError>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.rules.push((pattern.to_string(), Ok(rows)));
        self
    }

    pub(crate) fn fail(mut self, pattern: &str, err: QueryError) -> Self {
        self.rules.push((pattern.to_string(), Err(err)));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// The recorded statement that contains `pattern`.
    pub(crate) fn call_containing(&self, pattern: &str) -> Option<String> {
        self.calls().into_iter().find(|sql| sql.contains(pattern))
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str, _credential: &Credential) -> Result<Vec<Row>, QueryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(sql.to_string());
        }

        self.rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Builds a row from string cells; `None` is SQL NULL.
pub(crate) fn row(cells: &[Option<&str>]) -> Row {
    cells.iter().map(|cell| cell.map(str::to_string)).collect()
}

pub(crate) fn credential() -> Credential {
    Credential::bearer("test-token").expect("non-blank test token")
}
