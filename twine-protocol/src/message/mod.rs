mod direct;
mod envelope;
mod id;
mod status;
mod text;
mod user;

pub use direct::{DirectMessage, DirectMessageBuilder};
pub use envelope::Message;
pub use id::MessageId;
pub use status::{Status, StatusBuilder};
pub use text::{hashtags, mentioned_usernames};
pub use user::User;
