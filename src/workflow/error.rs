use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(DatabaseError),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        WorkflowError::NotFound { entity, id }
    }
}

impl From<DatabaseError> for WorkflowError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(message) => WorkflowError::Conflict(message),
            DatabaseError::Duplicate => {
                WorkflowError::Duplicate("record already exists".to_string())
            }
            DatabaseError::InvalidInput(message) => WorkflowError::Validation(message),
            other => WorkflowError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        WorkflowError::Validation(errors.to_string())
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
