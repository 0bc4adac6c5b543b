//! Error types shared across the store, the logging flows and the view state.

use thiserror::Error;

/// Failures reported by the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("store connection lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(msg.unwrap_or_else(|| err.to_string()))
            }
            other => StoreError::Sqlite(other),
        }
    }
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

/// An action blocked before any write because its input is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("exercise name is empty")]
    EmptyExerciseName,
    #[error("an exercise needs at least one tracker")]
    NoTrackers,
    #[error("tracker name is empty")]
    EmptyTrackerName,
    #[error("no value entered for tracker '{0}'")]
    MissingValue(String),
    #[error("no exercise selected")]
    NoExerciseSelected,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("view state lock poisoned")]
    StatePoisoned,
    #[error("render error: {0}")]
    Render(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type Result<T> = std::result::Result<T, Error>;
