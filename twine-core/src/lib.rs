//! Core shared library for the Twine client.
//!
//! This crate exposes the primitives every other crate in the workspace
//! depends on: the canonical error type, client configuration loading and
//! logging setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{ClientConfig, Environment, SessionConfig};
pub use errors::{ConfigError, Result as CoreResult, TwineError};
