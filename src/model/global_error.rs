use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::service::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,

    // 401 UNAUTHORIZED
    AuthenticationFailed,

    // 404 NOT FOUND
    IssueNotFound,
    ToolNotFound,

    // 500 SERVER ERRORS
    QueryFailed,
    InternalError,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Invalid tool arguments",
            ErrorCode::AuthenticationFailed => "Snowflake token not available",
            ErrorCode::IssueNotFound => "Issue not found",
            ErrorCode::ToolNotFound => "Unknown tool",
            ErrorCode::QueryFailed => "Error reading from Snowflake",
            ErrorCode::InternalError => "Internal server error",
        }
    }

    pub fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,

            ErrorCode::AuthenticationFailed => StatusCode::UNAUTHORIZED,

            ErrorCode::IssueNotFound |
            ErrorCode::ToolNotFound => StatusCode::NOT_FOUND,

            ErrorCode::QueryFailed |
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: String) -> Self {
        AppError::ApiError(code, Some(detail))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ApiError(code, _) => *code,
        }
    }

    /// The payload every failed operation returns, over HTTP and stdio alike.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            AppError::ApiError(code, detail) => ErrorResponse {
                error: detail.clone().unwrap_or_else(|| code.message().to_string()),
                code: format!("{:?}", code),
            },
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let code = match &err {
            ServiceError::Authentication(_) => ErrorCode::AuthenticationFailed,
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::QueryExecution(_) => ErrorCode::QueryFailed,
            ServiceError::NotFound(_) => ErrorCode::IssueNotFound,
            ServiceError::UnknownTool(_) => ErrorCode::ToolNotFound,
            ServiceError::Internal(_) => ErrorCode::InternalError,
        };
        AppError::with_detail(code, err.to_string())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        self.code().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.code().status_code())
            .json(self.to_response())
    }
}
