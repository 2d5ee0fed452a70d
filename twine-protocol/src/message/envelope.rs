use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::text;
use super::{DirectMessage, MessageId, Status, User};

/// Any message a timeline can hold.
///
/// Equality and hashing only look at the id, so a refetched copy of a
/// message (with updated counters, say) is the same message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Status(Status),
    DirectMessage(DirectMessage),
}

impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Message::Status(status) => status.id,
            Message::DirectMessage(dm) => dm.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Message::Status(status) => status.created_at,
            Message::DirectMessage(dm) => dm.created_at,
        }
    }

    /// Author of a status, sender of a direct message.
    pub fn author(&self) -> &User {
        match self {
            Message::Status(status) => &status.author,
            Message::DirectMessage(dm) => &dm.sender,
        }
    }

    pub fn recipient(&self) -> Option<&User> {
        match self {
            Message::Status(_) => None,
            Message::DirectMessage(dm) => Some(&dm.recipient),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Status(status) => &status.original().text,
            Message::DirectMessage(dm) => &dm.text,
        }
    }

    pub fn is_retweet(&self) -> bool {
        matches!(self, Message::Status(status) if status.is_retweet())
    }

    pub fn is_favorite(&self) -> bool {
        matches!(self, Message::Status(status) if status.is_favorite)
    }

    pub fn in_reply_to(&self) -> Option<MessageId> {
        match self {
            Message::Status(status) => status.in_reply_to,
            Message::DirectMessage(_) => None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to().is_some()
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Message::DirectMessage(_))
    }

    pub fn is_authored_by(&self, screen_name: &str) -> bool {
        self.author().is(screen_name)
    }

    /// Usernames mentioned in the body, excluding the author.
    pub fn mentioned_usernames(&self) -> Vec<String> {
        let author = self.author();
        text::mentioned_usernames(self.text())
            .into_iter()
            .filter(|name| !author.is(name))
            .collect()
    }

    pub fn hashtags(&self) -> Vec<String> {
        text::hashtags(self.text())
    }

    /// Everyone a reply should address: the author (or the retweeted
    /// author) followed by the mentions, never `own_screen_name`.
    pub fn reply_participants(&self, own_screen_name: &str) -> Vec<String> {
        let mut participants: Vec<String> = Vec::new();
        if let Message::Status(status) = self {
            if status.is_retweet() {
                participants.push(status.original().author.screen_name.clone());
            }
        }
        participants.push(self.author().screen_name.clone());
        participants.extend(text::mentioned_usernames(self.text()));

        let mut unique: Vec<String> = Vec::new();
        for name in participants {
            let is_self = name.eq_ignore_ascii_case(own_screen_name.trim_start_matches('@'));
            if !is_self && !unique.iter().any(|seen| seen.eq_ignore_ascii_case(&name)) {
                unique.push(name);
            }
        }
        unique
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl From<Status> for Message {
    fn from(status: Status) -> Self {
        Message::Status(status)
    }
}

impl From<DirectMessage> for Message {
    fn from(dm: DirectMessage) -> Self {
        Message::DirectMessage(dm)
    }
}
