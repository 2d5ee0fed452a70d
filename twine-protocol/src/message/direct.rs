use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MessageId, User};

/// Private message between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub created_at: DateTime<Utc>,
    pub sender: User,
    pub recipient: User,
    pub text: String,
}

impl DirectMessage {
    pub fn builder(id: u64, sender: User, recipient: User) -> DirectMessageBuilder {
        DirectMessageBuilder::new(id, sender, recipient)
    }
}

pub struct DirectMessageBuilder {
    message: DirectMessage,
}

impl DirectMessageBuilder {
    pub fn new(id: u64, sender: User, recipient: User) -> Self {
        Self {
            message: DirectMessage {
                id: MessageId(id),
                created_at: Utc::now(),
                sender,
                recipient,
                text: String::new(),
            },
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.message.created_at = created_at;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.message.text = text.into();
        self
    }

    pub fn build(self) -> DirectMessage {
        self.message
    }
}
