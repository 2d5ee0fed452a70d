use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MessageId, User};

/// Public status posted by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: MessageId,
    pub created_at: DateTime<Utc>,
    pub author: User,
    pub text: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Status>>,
    #[serde(default)]
    pub retweet_count: u32,
    #[serde(default)]
    pub favorite_count: u32,
}

impl Status {
    pub fn builder(id: u64, author: User) -> StatusBuilder {
        StatusBuilder::new(id, author)
    }

    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }

    /// The status whose content is displayed: the original for a retweet.
    pub fn original(&self) -> &Status {
        self.retweeted_status.as_deref().unwrap_or(self)
    }
}

/// Builder helper to create statuses with many optional fields.
pub struct StatusBuilder {
    status: Status,
}

impl StatusBuilder {
    pub fn new(id: u64, author: User) -> Self {
        Self {
            status: Status {
                id: MessageId(id),
                created_at: Utc::now(),
                author,
                text: String::new(),
                is_favorite: false,
                in_reply_to: None,
                retweeted_status: None,
                retweet_count: 0,
                favorite_count: 0,
            },
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.status.created_at = created_at;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.status.text = text.into();
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.status.is_favorite = is_favorite;
        self
    }

    pub fn in_reply_to(mut self, id: u64) -> Self {
        self.status.in_reply_to = Some(MessageId(id));
        self
    }

    pub fn retweet_of(mut self, original: Status) -> Self {
        self.status.retweeted_status = Some(Box::new(original));
        self
    }

    pub fn counts(mut self, retweets: u32, favorites: u32) -> Self {
        self.status.retweet_count = retweets;
        self.status.favorite_count = favorites;
        self
    }

    pub fn build(self) -> Status {
        self.status
    }
}
