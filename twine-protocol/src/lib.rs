pub mod message;

pub mod prelude {
    pub use crate::message::{
        DirectMessage, DirectMessageBuilder, Message, MessageId, Status, StatusBuilder, User,
    };
}
