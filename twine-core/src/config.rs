use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{ConfigError, TwineError};

/// Prefix used for every environment variable read by the client.
pub const ENV_PREFIX: &str = "TWINE_";

pub const DEFAULT_VISIBLE_TIMELINES: &str = "home";
pub const DEFAULT_BUFFERS: &str = "mentions, favorites, messages, own_tweets";
pub const DEFAULT_UPDATE_FREQUENCY_SECS: u64 = 300;
pub const DEFAULT_REFRESH_WORKERS: usize = 2;
pub const DEFAULT_FETCH_COUNT: u32 = 200;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" | "testing" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Timelines opened when the client starts.
///
/// Both fields are comma-separated timeline specifiers. `visible` timelines
/// are displayed side by side, `buffers` are opened behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub visible: String,
    pub buffers: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            visible: DEFAULT_VISIBLE_TIMELINES.to_string(),
            buffers: DEFAULT_BUFFERS.to_string(),
        }
    }
}

/// Configuration handed to the client components at construction time.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub session: SessionConfig,
    pub update_frequency: Duration,
    pub refresh_workers: usize,
    pub fetch_count: u32,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            session: SessionConfig::default(),
            update_frequency: Duration::from_secs(DEFAULT_UPDATE_FREQUENCY_SECS),
            refresh_workers: DEFAULT_REFRESH_WORKERS,
            fetch_count: DEFAULT_FETCH_COUNT,
            log_level: "info".to_string(),
        }
    }
}

/// On-disk representation, every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    environment: Option<String>,
    update_frequency: Option<u64>,
    refresh_workers: Option<usize>,
    fetch_count: Option<u32>,
    log_level: Option<String>,
    #[serde(default)]
    session: SessionFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionFile {
    visible: Option<String>,
    buffers: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::default().with_env_overrides(ENV_PREFIX, |key| env::var(key).ok())
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        Ok(Self::default().with_file(file))
    }

    /// Reads the TOML file at `path`, then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        dotenvy::dotenv().ok();
        Self::from_toml_str(&raw)?.with_env_overrides(ENV_PREFIX, |key| env::var(key).ok())
    }

    /// Applies overrides obtained through `lookup` for keys prefixed with `prefix`.
    pub fn with_env_overrides<F>(mut self, prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        if let Some(raw) = lookup(&key("ENV")) {
            self.environment = Environment::from_str(&raw);
        }
        if let Some(raw) = lookup(&key("VISIBLE_TIMELINES")) {
            self.session.visible = raw;
        }
        if let Some(raw) = lookup(&key("BUFFERS")) {
            self.session.buffers = raw;
        }
        if let Some(raw) = lookup(&key("UPDATE_FREQUENCY")) {
            let secs = parse_value::<u64>(&key("UPDATE_FREQUENCY"), &raw)?;
            self.update_frequency = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(&key("REFRESH_WORKERS")) {
            self.refresh_workers = parse_value(&key("REFRESH_WORKERS"), &raw)?;
        }
        if let Some(raw) = lookup(&key("FETCH_COUNT")) {
            self.fetch_count = parse_value(&key("FETCH_COUNT"), &raw)?;
        }
        if let Some(raw) = lookup(&key("LOG_LEVEL")) {
            self.log_level = raw;
        }

        Ok(self)
    }

    fn with_file(mut self, file: ConfigFile) -> Self {
        if let Some(raw) = file.environment {
            self.environment = Environment::from_str(&raw);
        }
        if let Some(secs) = file.update_frequency {
            self.update_frequency = Duration::from_secs(secs);
        }
        if let Some(workers) = file.refresh_workers {
            self.refresh_workers = workers;
        }
        if let Some(count) = file.fetch_count {
            self.fetch_count = count;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(visible) = file.session.visible {
            self.session.visible = visible;
        }
        if let Some(buffers) = file.session.buffers {
            self.session.buffers = buffers;
        }
        self
    }

    /// Whether the client is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Helper that loads config and converts to the canonical Twine error type.
pub fn load_client_config(path: Option<&Path>) -> Result<ClientConfig, TwineError> {
    match path {
        Some(path) => Ok(ClientConfig::load(path)?),
        None => Ok(ClientConfig::from_env()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_session() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.session.visible, "home");
        assert_eq!(cfg.session.buffers, DEFAULT_BUFFERS);
        assert_eq!(cfg.update_frequency, Duration::from_secs(300));
        assert_eq!(cfg.environment, Environment::Development);
    }

    #[test]
    fn env_overrides_apply_with_prefix() {
        let cfg = ClientConfig::default()
            .with_env_overrides(
                "TEST_",
                lookup(&[
                    ("TEST_ENV", "prod"),
                    ("TEST_VISIBLE_TIMELINES", "home, mentions"),
                    ("TEST_UPDATE_FREQUENCY", "60"),
                    ("TEST_REFRESH_WORKERS", "4"),
                ]),
            )
            .expect("overrides should apply");

        assert!(cfg.is_production());
        assert_eq!(cfg.session.visible, "home, mentions");
        assert_eq!(cfg.update_frequency, Duration::from_secs(60));
        assert_eq!(cfg.refresh_workers, 4);
        assert_eq!(cfg.fetch_count, DEFAULT_FETCH_COUNT);
    }

    #[test]
    fn rejects_non_numeric_frequency() {
        let err = ClientConfig::default()
            .with_env_overrides("T_", lookup(&[("T_UPDATE_FREQUENCY", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "T_UPDATE_FREQUENCY"
        ));
    }

    #[test]
    fn parses_toml_document() {
        let cfg = ClientConfig::from_toml_str(
            r#"
            update_frequency = 120
            log_level = "debug"

            [session]
            visible = "home, search:rust"
            "#,
        )
        .expect("toml should parse");

        assert_eq!(cfg.update_frequency, Duration::from_secs(120));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.session.visible, "home, search:rust");
        assert_eq!(cfg.session.buffers, DEFAULT_BUFFERS);
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        assert!(matches!(
            ClientConfig::from_toml_str("colour = \"blue\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetch_count = 50").unwrap();
        let cfg = ClientConfig::load(file.path()).expect("file should load");
        assert_eq!(cfg.fetch_count, 50);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ClientConfig::load("/nonexistent/twine.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/twine.toml"));
    }
}
