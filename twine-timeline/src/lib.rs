//! Timeline and buffer management for the Twine client.
//!
//! A [`Timeline`] is a deduplicated, newest-first collection of messages
//! bound to a fetch source. Timelines are grouped in a [`TimelineList`],
//! and a [`VisibleTimelineList`] adds the window of timelines displayed side
//! by side together with unread bookkeeping. Both lists, as well as each
//! timeline's message cursor, share the [`ActiveList`] navigation contract.

mod active_list;
mod error;
mod fetch;
mod list;
mod session;
mod timeline;
mod visible;

pub use active_list::{ActiveList, Cursor};
pub use error::TimelineError;
pub use fetch::{
    FetchError, FetchKind, FetchParams, FetchRequest, FetchSource, FnSource, UpdateDescriptor,
};
pub use list::{TimelineList, UpdateFailure, UpdateSummary};
pub use session::{
    build_session, build_timelines, default_session, parse_timeline_specifiers,
    SourceTimelineFactory, TimelineFactory, TimelineSpec,
};
pub use timeline::{MergeReport, Timeline, TimelineId};
pub use visible::VisibleTimelineList;

pub mod prelude {
    pub use crate::{
        ActiveList, FetchKind, FetchParams, FetchSource, Timeline, TimelineError, TimelineList,
        VisibleTimelineList,
    };
    pub use twine_protocol::prelude::*;
}
