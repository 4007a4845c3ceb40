//! Typed errors and HTTP mapping.

use crate::bootstrap::ConnectStrategy;
use crate::environment::EnvironmentKey;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Deployment misconfiguration: settings that cannot be parsed or a registry that
/// does not hold the handle a request (or startup) asked for.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("no database registered for environment '{0}'")]
    UnregisteredEnvironment(EnvironmentKey),
    #[error("database already registered for environment '{0}'")]
    AlreadyRegistered(EnvironmentKey),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("registry lock poisoned")]
    Poisoned,
}

/// One failed connection attempt during bootstrap.
#[derive(Debug, Clone)]
pub struct AttemptError {
    pub strategy: ConnectStrategy,
    pub reason: String,
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("no connection strategy configured")]
    NoStrategy,
    #[error("all connection strategies failed: {}", join_attempts(.0))]
    Exhausted(Vec<AttemptError>),
}

fn join_attempts(attempts: &[AttemptError]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Connection(#[from] ConnectError),
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("access denied")]
    Forbidden,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Structured context for the error body: the failed attempts of an exhausted connect.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Connection(ConnectError::Exhausted(attempts)) => Some(
                attempts
                    .iter()
                    .map(|a| {
                        serde_json::json!({
                            "strategy": a.strategy.to_string(),
                            "reason": a.reason,
                        })
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Connection(_) => (StatusCode::INTERNAL_SERVER_ERROR, "connection_error"),
            AppError::MissingToken => (StatusCode::UNAUTHORIZED, "missing_token"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
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

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "request failed: {}", self);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
