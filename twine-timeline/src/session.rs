//! Building the initial set of timelines from configuration strings.

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;
use twine_core::config::SessionConfig;
use twine_protocol::message::MessageId;

use crate::error::TimelineError;
use crate::fetch::{FetchKind, FetchParams, FetchSource, UpdateDescriptor};
use crate::timeline::Timeline;
use crate::visible::VisibleTimelineList;

/// Splits a comma-separated list of timeline specifiers, trimming each one and
/// dropping empty entries. Order is preserved.
pub fn parse_timeline_specifiers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// One parsed timeline specifier, e.g. `mentions` or `search:rust`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineSpec {
    Home,
    Mentions,
    Favorites,
    Messages,
    OwnTweets,
    RetweetsOfMe,
    Search(String),
    Hashtag(String),
    User(String),
    Thread(MessageId),
    List { owner: String, slug: String },
}

impl TimelineSpec {
    pub fn fetch_kind(&self) -> FetchKind {
        match self {
            TimelineSpec::Home => FetchKind::Home,
            TimelineSpec::Mentions => FetchKind::Mentions,
            TimelineSpec::Favorites => FetchKind::Favorites,
            TimelineSpec::Messages => FetchKind::DirectMessages,
            TimelineSpec::OwnTweets => FetchKind::OwnMessages,
            TimelineSpec::RetweetsOfMe => FetchKind::RetweetsOfMe,
            TimelineSpec::Search(query) => FetchKind::Search {
                query: query.clone(),
            },
            TimelineSpec::Hashtag(tag) => FetchKind::Search {
                query: format!("#{}", tag),
            },
            TimelineSpec::User(screen_name) => FetchKind::User {
                screen_name: screen_name.clone(),
            },
            TimelineSpec::Thread(status_id) => FetchKind::Thread {
                status_id: *status_id,
            },
            TimelineSpec::List { owner, slug } => FetchKind::List {
                owner: owner.clone(),
                slug: slug.clone(),
            },
        }
    }

    /// Display name of the timeline built for this specifier.
    pub fn name(&self) -> String {
        match self {
            TimelineSpec::Hashtag(tag) => format!("#{}", tag),
            other => other.fetch_kind().display_name(),
        }
    }
}

impl FromStr for TimelineSpec {
    type Err = TimelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid =
            || TimelineError::Configuration(format!("unknown timeline specifier {:?}", raw));
        let (head, argument) = match raw.split_once(':') {
            Some((head, argument)) => (head.trim(), Some(argument.trim())),
            None => (raw.trim(), None),
        };
        let head = head.to_ascii_lowercase();

        let spec = match (head.as_str(), argument) {
            ("home" | "tweets", None) => TimelineSpec::Home,
            ("mentions", None) => TimelineSpec::Mentions,
            ("favorites" | "favourites", None) => TimelineSpec::Favorites,
            ("messages" | "direct_messages", None) => TimelineSpec::Messages,
            ("own_tweets", None) => TimelineSpec::OwnTweets,
            ("retweets_of_me", None) => TimelineSpec::RetweetsOfMe,
            ("search", Some(query)) if !query.is_empty() => TimelineSpec::Search(query.to_string()),
            ("hashtag", Some(tag)) => {
                let tag = tag.trim_start_matches('#');
                if tag.is_empty() {
                    return Err(invalid());
                }
                TimelineSpec::Hashtag(tag.to_string())
            }
            ("user", Some(name)) => {
                let name = name.trim_start_matches('@');
                if name.is_empty() {
                    return Err(invalid());
                }
                TimelineSpec::User(name.to_string())
            }
            ("thread", Some(id)) => TimelineSpec::Thread(id.parse().map_err(|_| invalid())?),
            ("list", Some(path)) => match path.trim_start_matches('@').split_once('/') {
                Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() => TimelineSpec::List {
                    owner: owner.to_string(),
                    slug: slug.to_string(),
                },
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };

        Ok(spec)
    }
}

/// Resolves specifiers into timelines bound to an update source.
pub trait TimelineFactory {
    fn create(&self, spec: &TimelineSpec) -> Result<Timeline, TimelineError>;
}

/// Binds every timeline to the same fetch source.
pub struct SourceTimelineFactory {
    source: Arc<dyn FetchSource>,
    params: FetchParams,
}

impl SourceTimelineFactory {
    pub fn new(source: Arc<dyn FetchSource>) -> Self {
        Self {
            source,
            params: FetchParams::default(),
        }
    }

    /// Parameters bound to every timeline, typically the fetch count.
    pub fn with_params(mut self, params: FetchParams) -> Self {
        self.params = params;
        self
    }
}

impl TimelineFactory for SourceTimelineFactory {
    fn create(&self, spec: &TimelineSpec) -> Result<Timeline, TimelineError> {
        let update = UpdateDescriptor::new(Arc::clone(&self.source), spec.fetch_kind())
            .with_params(self.params);
        Ok(Timeline::with_update(spec.name(), update))
    }
}

/// Builds one timeline per valid specifier; invalid ones are skipped.
pub fn build_timelines(specifiers: &str, factory: &dyn TimelineFactory) -> Vec<Timeline> {
    parse_timeline_specifiers(specifiers)
        .iter()
        .filter_map(|token| {
            match token
                .parse::<TimelineSpec>()
                .and_then(|spec| factory.create(&spec))
            {
                Ok(timeline) => Some(timeline),
                Err(error) => {
                    warn!(specifier = %token, error = %error, "ignoring timeline specifier");
                    None
                }
            }
        })
        .collect()
}

/// Builds the initial timelines: the `visible` ones first, displayed side by
/// side with the first one active, then the `buffers`. A session without any
/// valid timeline falls back to the default session.
pub fn build_session(config: &SessionConfig, factory: &dyn TimelineFactory) -> VisibleTimelineList {
    let visible = build_timelines(&config.visible, factory);
    let buffers = build_timelines(&config.buffers, factory);

    if visible.is_empty() && buffers.is_empty() {
        let fallback = SessionConfig::default();
        if *config != fallback {
            warn!("session has no valid timelines, using the default session");
            return build_session(&fallback, factory);
        }
        return VisibleTimelineList::new();
    }

    let visible_count = visible.len();
    let mut list = VisibleTimelineList::new();
    for timeline in visible.into_iter().chain(buffers) {
        list.append_timeline(timeline);
    }
    if visible_count > 1 {
        list.set_visible_range(0, visible_count - 1);
    }
    list
}

pub fn default_session(factory: &dyn TimelineFactory) -> VisibleTimelineList {
    build_session(&SessionConfig::default(), factory)
}
