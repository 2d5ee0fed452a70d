//! Twine Engine - background refresh of timelines.
//!
//! Fetches run on a pool of tokio workers and never touch a timeline: each
//! worker executes a detached [`twine_timeline::FetchRequest`] and sends a
//! [`RefreshOutcome`] back over a channel. The task owning the timelines
//! merges outcomes with [`apply_outcome`], which silently drops results for
//! timelines deleted in the meantime.

pub mod driver;
pub mod error;
pub mod runtime;
pub mod scheduler;
pub mod task;
pub mod timer;

pub use driver::{
    apply_outcome, delete_active_timeline, submit_refresh, submit_refresh_all, AppliedOutcome,
};
pub use error::EngineError;
pub use runtime::{RefreshHandle, RefreshRuntime};
pub use scheduler::RefreshScheduler;
pub use task::{RefreshOutcome, RefreshPriority, RefreshRecord, RefreshStatus, RefreshTask};
pub use timer::RefreshTimer;
