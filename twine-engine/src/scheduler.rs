use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use twine_timeline::TimelineId;

use crate::task::RefreshTask;

type SharedQueues = Arc<RwLock<HashMap<TimelineId, VecDeque<RefreshTask>>>>;
type SharedRotation = Arc<RwLock<VecDeque<TimelineId>>>;

/// Refresh queue that serves timelines fairly.
///
/// Each timeline has its own queue ordered by priority, then schedule time.
/// Timelines take turns, so one busy timeline cannot starve the others.
#[derive(Default, Clone)]
pub struct RefreshScheduler {
    queues: SharedQueues,
    rotation: SharedRotation,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task, respecting priority ordering.
    pub fn enqueue(&self, task: RefreshTask) {
        let timeline_id = task.timeline_id;
        {
            let mut queues = self.queues.write();
            let queue = queues.entry(timeline_id).or_default();

            let insert_index = queue.iter().position(|existing| {
                task.priority < existing.priority
                    || (task.priority == existing.priority
                        && task.scheduled_for < existing.scheduled_for)
            });

            match insert_index {
                Some(idx) => queue.insert(idx, task),
                None => queue.push_back(task),
            }
        }

        let mut rotation = self.rotation.write();
        if !rotation.contains(&timeline_id) {
            rotation.push_back(timeline_id);
        }
    }

    /// Returns the next task to execute following a round-robin strategy.
    pub fn next_task(&self) -> Option<RefreshTask> {
        let mut rotation = self.rotation.write();
        let mut queues = self.queues.write();

        for _ in 0..rotation.len() {
            let Some(timeline_id) = rotation.pop_front() else {
                break;
            };

            let mut drained = false;
            let task = queues.get_mut(&timeline_id).and_then(|queue| {
                let task = queue.pop_front();
                drained = queue.is_empty();
                task
            });

            if drained {
                queues.remove(&timeline_id);
            } else if queues.contains_key(&timeline_id) {
                rotation.push_back(timeline_id);
            }

            if task.is_some() {
                return task;
            }
        }

        None
    }

    /// Drops every queued task for `timeline_id`, returning them.
    pub fn cancel_timeline(&self, timeline_id: TimelineId) -> Vec<RefreshTask> {
        let mut rotation = self.rotation.write();
        let mut queues = self.queues.write();
        rotation.retain(|id| *id != timeline_id);
        queues
            .remove(&timeline_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub fn pending(&self) -> usize {
        self.queues.read().values().map(VecDeque::len).sum()
    }

    pub fn pending_for_timeline(&self, timeline_id: TimelineId) -> usize {
        self.queues
            .read()
            .get(&timeline_id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}
