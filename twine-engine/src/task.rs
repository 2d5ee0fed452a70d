use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use twine_protocol::message::Message;
use twine_timeline::{FetchError, FetchRequest, TimelineId};
use uuid::Uuid;

/// Refresh priority. Lower is more urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RefreshPriority {
    /// The user asked for this timeline to be refreshed.
    UserInitiated = 0,
    /// Regular refresh triggered by the update timer.
    #[default]
    Periodic = 50,
    /// Loading older messages.
    Backfill = 100,
}

/// A fetch scheduled for one timeline.
#[derive(Debug, Clone)]
pub struct RefreshTask {
    pub id: Uuid,
    pub timeline_id: TimelineId,
    pub timeline_name: String,
    pub request: FetchRequest,
    pub priority: RefreshPriority,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTask {
    pub fn builder(timeline_id: TimelineId, request: FetchRequest) -> RefreshTaskBuilder {
        RefreshTaskBuilder {
            timeline_id,
            timeline_name: String::new(),
            request,
            priority: RefreshPriority::default(),
            scheduled_for: Utc::now(),
        }
    }
}

pub struct RefreshTaskBuilder {
    timeline_id: TimelineId,
    timeline_name: String,
    request: FetchRequest,
    priority: RefreshPriority,
    scheduled_for: DateTime<Utc>,
}

impl RefreshTaskBuilder {
    pub fn timeline_name(mut self, name: impl Into<String>) -> Self {
        self.timeline_name = name.into();
        self
    }

    pub fn priority(mut self, priority: RefreshPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn scheduled_for(mut self, scheduled_for: DateTime<Utc>) -> Self {
        self.scheduled_for = scheduled_for;
        self
    }

    pub fn build(self) -> RefreshTask {
        RefreshTask {
            id: Uuid::new_v4(),
            timeline_id: self.timeline_id,
            timeline_name: self.timeline_name,
            request: self.request,
            priority: self.priority,
            scheduled_for: self.scheduled_for,
            created_at: Utc::now(),
        }
    }
}

/// Current status of a refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RefreshStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Result of a finished refresh, handed back to the owner of the timelines.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub task_id: Uuid,
    pub timeline_id: TimelineId,
    pub timeline_name: String,
    pub status: RefreshStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: Result<Vec<Message>, FetchError>,
}

impl RefreshOutcome {
    pub fn success(task: &RefreshTask, started_at: DateTime<Utc>, messages: Vec<Message>) -> Self {
        Self {
            task_id: task.id,
            timeline_id: task.timeline_id,
            timeline_name: task.timeline_name.clone(),
            status: RefreshStatus::Completed,
            started_at,
            finished_at: Utc::now(),
            result: Ok(messages),
        }
    }

    pub fn failure(task: &RefreshTask, started_at: DateTime<Utc>, error: FetchError) -> Self {
        Self {
            task_id: task.id,
            timeline_id: task.timeline_id,
            timeline_name: task.timeline_name.clone(),
            status: RefreshStatus::Failed,
            started_at,
            finished_at: Utc::now(),
            result: Err(error),
        }
    }
}

/// In-memory record that tracks the lifecycle of a refresh.
#[derive(Debug, Clone)]
pub struct RefreshRecord {
    pub task_id: Uuid,
    pub timeline_id: TimelineId,
    pub timeline_name: String,
    pub priority: RefreshPriority,
    pub status: RefreshStatus,
    pub scheduled_for: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub fetched: Option<usize>,
    pub last_error: Option<String>,
}

impl RefreshRecord {
    pub fn new(task: &RefreshTask) -> Self {
        Self {
            task_id: task.id,
            timeline_id: task.timeline_id,
            timeline_name: task.timeline_name.clone(),
            priority: task.priority,
            status: RefreshStatus::Queued,
            scheduled_for: task.scheduled_for,
            started_at: None,
            finished_at: None,
            fetched: None,
            last_error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            RefreshStatus::Completed | RefreshStatus::Failed | RefreshStatus::Cancelled
        )
    }
}
