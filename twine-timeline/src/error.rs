use thiserror::Error;
use twine_core::TwineError;

use crate::fetch::FetchError;

/// Errors surfaced by timeline operations.
///
/// Structural operations (adding, removing, shifting, resizing the visible
/// window) never fail; they degrade to no-ops instead. Only accessors that
/// need an active element and refreshes can return an error.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The operation needs a capability the timeline was not built with.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The fetch source failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// There is no active element to return.
    #[error("{0} is empty")]
    EmptyCollection(&'static str),
}

impl TimelineError {
    pub fn missing_update_source() -> Self {
        TimelineError::Configuration("timeline has no update source".into())
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, TimelineError::Fetch(_))
    }
}

impl From<TimelineError> for TwineError {
    fn from(value: TimelineError) -> Self {
        match value {
            TimelineError::Configuration(message) => TwineError::ConfigError(message),
            other => TwineError::TimelineError(other.to_string()),
        }
    }
}
