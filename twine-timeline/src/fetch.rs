use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use twine_protocol::message::{Message, MessageId};

/// What a timeline fetches from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchKind {
    Home,
    Mentions,
    Favorites,
    DirectMessages,
    OwnMessages,
    RetweetsOfMe,
    User { screen_name: String },
    Search { query: String },
    Thread { status_id: MessageId },
    List { owner: String, slug: String },
}

impl FetchKind {
    /// Label shown for a timeline bound to this kind.
    pub fn display_name(&self) -> String {
        match self {
            FetchKind::Home => "tweets".to_string(),
            FetchKind::Mentions => "mentions".to_string(),
            FetchKind::Favorites => "favorites".to_string(),
            FetchKind::DirectMessages => "messages".to_string(),
            FetchKind::OwnMessages => "own tweets".to_string(),
            FetchKind::RetweetsOfMe => "retweets of me".to_string(),
            FetchKind::User { screen_name } => format!("@{}", screen_name),
            FetchKind::Search { query } => format!("search: {}", query),
            FetchKind::Thread { status_id } => format!("thread {}", status_id),
            FetchKind::List { owner, slug } => format!("@{}/{}", owner, slug),
        }
    }

    /// Stable textual key, e.g. `home` or `search:rust`.
    pub fn key(&self) -> String {
        match self {
            FetchKind::Home => "home".to_string(),
            FetchKind::Mentions => "mentions".to_string(),
            FetchKind::Favorites => "favorites".to_string(),
            FetchKind::DirectMessages => "messages".to_string(),
            FetchKind::OwnMessages => "own_tweets".to_string(),
            FetchKind::RetweetsOfMe => "retweets_of_me".to_string(),
            FetchKind::User { screen_name } => format!("user:{}", screen_name),
            FetchKind::Search { query } => format!("search:{}", query),
            FetchKind::Thread { status_id } => format!("thread:{}", status_id),
            FetchKind::List { owner, slug } => format!("list:{}/{}", owner, slug),
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Pagination hints passed along with a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    /// Only return messages newer than this id.
    pub since_id: Option<MessageId>,
    /// Only return messages with an id up to this one.
    pub max_id: Option<MessageId>,
    /// Upper bound on the number of messages returned.
    pub count: Option<u32>,
}

impl FetchParams {
    pub fn since(id: MessageId) -> Self {
        Self {
            since_id: Some(id),
            ..Self::default()
        }
    }

    pub fn until(id: MessageId) -> Self {
        Self {
            max_id: Some(id),
            ..Self::default()
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Values set in `overrides` replace the ones in `self`.
    pub fn merged_with(&self, overrides: &FetchParams) -> FetchParams {
        FetchParams {
            since_id: overrides.since_id.or(self.since_id),
            max_id: overrides.max_id.or(self.max_id),
            count: overrides.count.or(self.count),
        }
    }
}

/// Failure reported by a fetch source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

/// Source of messages for timelines.
///
/// Implementations perform the remote call (or replay, or fake it in tests);
/// they never see the timeline they are fetching for.
#[async_trait]
pub trait FetchSource: Send + Sync + 'static {
    async fn fetch(&self, kind: &FetchKind, params: &FetchParams)
        -> Result<Vec<Message>, FetchError>;
}

/// Adapts a plain function or closure into a [`FetchSource`].
pub struct FnSource<F>(F);

impl<F> FnSource<F>
where
    F: Fn(&FetchKind, &FetchParams) -> Result<Vec<Message>, FetchError> + Send + Sync + 'static,
{
    pub fn new(fetch: F) -> Self {
        FnSource(fetch)
    }
}

#[async_trait]
impl<F> FetchSource for FnSource<F>
where
    F: Fn(&FetchKind, &FetchParams) -> Result<Vec<Message>, FetchError> + Send + Sync + 'static,
{
    async fn fetch(
        &self,
        kind: &FetchKind,
        params: &FetchParams,
    ) -> Result<Vec<Message>, FetchError> {
        (self.0)(kind, params)
    }
}

/// The refresh operation bound to a timeline: a source, what to fetch from it
/// and the parameters fixed when the timeline was created.
#[derive(Clone)]
pub struct UpdateDescriptor {
    source: Arc<dyn FetchSource>,
    kind: FetchKind,
    params: FetchParams,
}

impl UpdateDescriptor {
    pub fn new(source: Arc<dyn FetchSource>, kind: FetchKind) -> Self {
        Self {
            source,
            kind,
            params: FetchParams::default(),
        }
    }

    pub fn with_params(mut self, params: FetchParams) -> Self {
        self.params = params;
        self
    }

    pub fn kind(&self) -> &FetchKind {
        &self.kind
    }

    pub fn params(&self) -> &FetchParams {
        &self.params
    }

    /// Snapshot of one invocation; `overrides` apply to it only.
    pub fn request(&self, overrides: &FetchParams) -> FetchRequest {
        FetchRequest {
            source: Arc::clone(&self.source),
            kind: self.kind.clone(),
            params: self.params.merged_with(overrides),
        }
    }
}

impl fmt::Debug for UpdateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateDescriptor")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A fetch ready to run, detached from the timeline that produced it.
///
/// Requests are `Send + 'static` so they can be executed on a worker while
/// the owner of the timeline keeps mutating it.
#[derive(Clone)]
pub struct FetchRequest {
    source: Arc<dyn FetchSource>,
    kind: FetchKind,
    params: FetchParams,
}

impl FetchRequest {
    pub fn kind(&self) -> &FetchKind {
        &self.kind
    }

    pub fn params(&self) -> &FetchParams {
        &self.params
    }

    pub async fn execute(&self) -> Result<Vec<Message>, FetchError> {
        self.source.fetch(&self.kind, &self.params).await
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
