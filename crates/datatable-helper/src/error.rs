use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("table {0} has no visible columns")]
    TableUnavailable(String),

    #[error("order column {index} out of range ({count} columns)")]
    OrderColumnOutOfRange { index: usize, count: usize },

    #[error("failed to open database: {path}: {source}")]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query execution failed: {0}")]
    QueryFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        // Only SQLite's own message; statement text stays out of error payloads.
        let msg = match e {
            rusqlite::Error::SqliteFailure(err, Some(msg)) => format!("{msg} ({:?})", err.code),
            rusqlite::Error::SqlInputError { error, msg, .. } => format!("{msg} ({:?})", error.code),
            other => other.to_string(),
        };
        AppError::QueryFailed(msg)
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
            AppError::TableUnavailable(_) => "TABLE_UNAVAILABLE",
            AppError::OrderColumnOutOfRange { .. } => "ORDER_OUT_OF_RANGE",
            AppError::DbOpenFailed { .. } => "DB_OPEN_FAILED",
            AppError::QueryFailed(_) => "QUERY_FAILED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
