use std::io;

use thiserror::Error;

/// Result type used across the Twine core crate.
pub type Result<T> = std::result::Result<T, TwineError>;

/// Canonical error representation shared by the client crates.
#[derive(Debug, Error)]
pub enum TwineError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("timeline error: {0}")]
    TimelineError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for TwineError {
    fn from(err: serde_json::Error) -> Self {
        TwineError::DeserializationError(err.to_string())
    }
}

impl From<toml::de::Error> for TwineError {
    fn from(err: toml::de::Error) -> Self {
        TwineError::ConfigError(err.to_string())
    }
}

impl From<anyhow::Error> for TwineError {
    fn from(err: anyhow::Error) -> Self {
        TwineError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read configuration file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<ConfigError> for TwineError {
    fn from(value: ConfigError) -> Self {
        TwineError::ConfigError(value.to_string())
    }
}
