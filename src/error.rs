use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error category attached to error responses so the language middleware can
/// localize the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Authorization,
    Authentication,
    Conflict,
    Duplicate,
    Validation,
    BadRequest,
    Internal,
    Unavailable,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Validation => "validation",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// Fluent message id of the user-facing text.
    pub fn message_key(&self) -> String {
        format!("error-{}", self.code().replace('_', "-"))
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Authorization => "Access denied",
            ErrorKind::Authentication => "Authentication failed",
            ErrorKind::Conflict => "Resource conflict",
            ErrorKind::Duplicate => "Resource already exists",
            ErrorKind::Validation => "Validation error",
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Internal => "An internal server error occurred",
            ErrorKind::Unavailable => "Service unavailable",
        }
    }
}

/// Response extension describing an error body before localization.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub details: String,
}

impl ErrorReport {
    pub fn body(&self, message: &str) -> serde_json::Value {
        json!({
            "error": {
                "code": self.kind.code(),
                "message": message,
                "details": self.details,
            }
        })
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(err) => match err {
                DatabaseError::NotFound => ErrorKind::NotFound,
                DatabaseError::Duplicate => ErrorKind::Duplicate,
                DatabaseError::Conflict(_) => ErrorKind::Conflict,
                DatabaseError::InvalidInput(_) => ErrorKind::BadRequest,
                DatabaseError::ConnectionError(_) => ErrorKind::Unavailable,
                _ => ErrorKind::Internal,
            },
            AppError::Authentication(_) => ErrorKind::Authentication,
            AppError::Authorization(_) => ErrorKind::Authorization,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Duplicate(_) => ErrorKind::Duplicate,
            AppError::InternalServerError(_) => ErrorKind::Internal,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::ServiceUnavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict | ErrorKind::Duplicate => StatusCode::CONFLICT,
            ErrorKind::Validation | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn details(&self) -> String {
        match self.kind() {
            // Storage internals stay in the logs.
            ErrorKind::Internal | ErrorKind::Unavailable => self.kind().default_message().to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound { .. } => AppError::NotFound(err.to_string()),
            WorkflowError::Authorization(message) => AppError::Authorization(message),
            WorkflowError::Conflict(message) => AppError::Conflict(message),
            WorkflowError::Duplicate(message) => AppError::Duplicate(message),
            WorkflowError::Validation(message) => AppError::Validation(message),
            WorkflowError::Store(err) => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let report = ErrorReport {
            kind,
            details: self.details(),
        };
        let mut response = (status, Json(report.body(kind.default_message()))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_errors_map_to_status_codes() {
        let cases = [
            (WorkflowError::not_found("nomination", 1), StatusCode::NOT_FOUND),
            (WorkflowError::Authorization("no".into()), StatusCode::FORBIDDEN),
            (WorkflowError::Conflict("late".into()), StatusCode::CONFLICT),
            (WorkflowError::Duplicate("twice".into()), StatusCode::CONFLICT),
            (WorkflowError::Validation("empty".into()), StatusCode::BAD_REQUEST),
            (
                WorkflowError::Store(DatabaseError::TransactionError("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = AppError::Database(DatabaseError::TransactionError("secret".into()));
        assert!(!err.details().contains("secret"));
    }

    #[test]
    fn test_error_kind_carried_in_response_extensions() {
        let response = AppError::Conflict("already final".into()).into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.kind, ErrorKind::Conflict);
        assert_eq!(report.details, "Conflict: already final");
    }
}
