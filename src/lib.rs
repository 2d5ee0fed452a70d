//! Twine: timeline and buffer management for a terminal micro-blogging client.
//!
//! The workspace is split in several crates, re-exported here:
//!
//! * [`core`]: errors, configuration and logging setup
//! * [`protocol`]: the message model (statuses, direct messages, users)
//! * [`timeline`]: timelines, timeline lists and the visible window
//! * [`engine`]: background refresh workers and their scheduler

pub use twine_core as core;
pub use twine_engine as engine;
pub use twine_protocol as protocol;
pub use twine_timeline as timeline;

pub use twine_core::{ClientConfig, SessionConfig, TwineError};
pub use twine_protocol::message::{Message, MessageId};
pub use twine_timeline::{ActiveList, Timeline, TimelineList, VisibleTimelineList};

/// Version of the Twine client core.
pub const TWINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use twine_engine::{RefreshHandle, RefreshPriority, RefreshRuntime};
    pub use twine_timeline::prelude::*;
}
