use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Database unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    /// A failure annotated with the description of the operation it aborted.
    #[error("{message}: {source}")]
    Operation {
        message: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Attaches a human description of the failed operation, e.g.
    /// "Error fetching products". The innermost cause is kept as the `error`
    /// field of the response body.
    pub fn context(self, message: impl Into<String>) -> Self {
        match self {
            AppError::Operation { source, .. } => AppError::Operation {
                message: message.into(),
                source,
            },
            other => AppError::Operation {
                message: message.into(),
                source: Box::new(other),
            },
        }
    }

    /// Every failure kind surfaces as a 500; callers tell "no such record"
    /// apart by inspecting a successful body instead.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn summary(&self) -> String {
        match self {
            AppError::InvalidId(_) => "Invalid identifier".to_string(),
            AppError::InvalidRequest(_) => "Invalid request".to_string(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            AppError::StoreUnavailable(_) => "Database unavailable".to_string(),
            AppError::ConfigError(_) => "Configuration error".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::Operation { message, .. } => message.clone(),
        }
    }

    fn cause(&self) -> String {
        match self {
            AppError::InvalidId(msg)
            | AppError::InvalidRequest(msg)
            | AppError::StoreUnavailable(msg) => msg.clone(),
            AppError::DatabaseError(err)
            | AppError::ConfigError(err)
            | AppError::InternalError(err) => err.to_string(),
            AppError::Operation { source, .. } => source.cause(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<bson::oid::Error> for AppError {
    fn from(err: bson::oid::Error) -> Self {
        AppError::InvalidId(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            message: self.summary(),
            error: self.cause(),
        };

        tracing::error!(
            status = status.as_u16(),
            message = %body.message,
            error = %body.error,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}
