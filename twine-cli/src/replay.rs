//! Fetch source answering from a JSON file recorded ahead of time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use twine_protocol::message::Message;
use twine_timeline::{FetchError, FetchKind, FetchParams, FetchSource};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Serves recorded messages keyed by [`FetchKind::key`], honouring the
/// pagination hints the way the remote service does.
#[derive(Debug, Default)]
pub struct ReplaySource {
    feeds: HashMap<String, Vec<Message>>,
}

impl ReplaySource {
    pub fn new(feeds: HashMap<String, Vec<Message>>) -> Self {
        Self { feeds }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ReplayError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn feed_keys(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }
}

#[async_trait]
impl FetchSource for ReplaySource {
    async fn fetch(
        &self,
        kind: &FetchKind,
        params: &FetchParams,
    ) -> Result<Vec<Message>, FetchError> {
        let Some(recorded) = self.feeds.get(&kind.key()) else {
            debug!(kind = %kind, "nothing recorded");
            return Ok(Vec::new());
        };

        let mut messages: Vec<Message> = recorded
            .iter()
            .filter(|message| params.since_id.map_or(true, |since| message.id() > since))
            .filter(|message| params.max_id.map_or(true, |max| message.id() <= max))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id().cmp(&a.id()));
        if let Some(count) = params.count {
            messages.truncate(count as usize);
        }
        Ok(messages)
    }
}
