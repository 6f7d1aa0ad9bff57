//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("duplicate table '{table}' in snapshot of database '{database}'")]
    DuplicateTable { database: String, table: String },
    #[error("snapshot store: {0}")]
    Store(#[from] std::io::Error),
    #[error("snapshot parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Introspection step that failed for one catalog query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntrospectStep {
    Tables,
    Columns,
    PrimaryKey,
}

impl std::fmt::Display for IntrospectStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IntrospectStep::Tables => "tables",
            IntrospectStep::Columns => "columns",
            IntrospectStep::PrimaryKey => "primary_key",
        })
    }
}

#[derive(Error, Debug)]
#[error("introspecting {database}: {step} query failed{}: {message}", table_suffix(.table))]
pub struct IntrospectError {
    pub database: String,
    pub step: IntrospectStep,
    pub table: Option<String>,
    pub message: String,
}

fn table_suffix(table: &Option<String>) -> String {
    table.as_deref().map(|t| format!(" for table {}", t)).unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Introspect(#[from] IntrospectError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Introspect(_) => (StatusCode::INTERNAL_SERVER_ERROR, "introspection_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::NOT_FOUND, "field_not_found"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_map_to_not_found() {
        let (status, code) = AppError::Validation("field name not found in table".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "field_not_found");
    }

    #[test]
    fn introspect_error_names_table_and_step() {
        let e = IntrospectError {
            database: "shop".into(),
            step: IntrospectStep::PrimaryKey,
            table: Some("product".into()),
            message: "boom".into(),
        };
        assert_eq!(
            e.to_string(),
            "introspecting shop: primary_key query failed for table product: boom"
        );
    }
}
