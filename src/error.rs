use uuid::Uuid;

/// Error type for tracker operations
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(Uuid),
    #[error("timer already running for task: {0}")]
    Conflict(Uuid),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("persistence failure")]
    Persistence(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
