use thiserror::Error;

use crate::db::QueryError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Authentication(String),
    #[error("invalid arguments: {0}")]
    Validation(String),
    #[error("query execution failed: {0}")]
    QueryExecution(QueryError),
    #[error("{0}")]
    NotFound(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn missing_credential() -> Self {
        ServiceError::Authentication("Snowflake token not available".to_string())
    }
}

impl From<QueryError> for ServiceError {
    /// The warehouse answering 401/403 means the credential itself was refused.
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Status { status: 401 | 403, .. } => {
                ServiceError::Authentication("Authentication failed: Invalid or expired token".to_string())
            }
            other => ServiceError::QueryExecution(other),
        }
    }
}
