use thiserror::Error;

/// Failure of a registry or engine operation.
///
/// Every variant aborts the surrounding transaction; nothing is partially
/// written when one of these is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable code used in the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "bad_params",
            Self::NotFound { .. } => "not_found",
            Self::Constraint(_) => "constraint_failed",
            Self::Forbidden(_) => "forbidden",
            Self::Storage(_) => "db_query_failed",
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint(e.to_string())
            }
            _ => Self::Storage(e),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
