use thiserror::Error;

/// Errors that may occur when interacting with the refresh engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("refresh task not found: {0}")]
    TaskNotFound(String),
    #[error("timeline not found: {0}")]
    TimelineNotFound(String),
    #[error("refresh engine is shutting down")]
    ShuttingDown,
    #[error("refresh rejected: {0}")]
    Rejected(String),
}
