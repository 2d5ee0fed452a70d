use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::RwLock;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use twine_timeline::TimelineId;
use uuid::Uuid;

use crate::error::EngineError;
use crate::scheduler::RefreshScheduler;
use crate::task::{RefreshOutcome, RefreshRecord, RefreshStatus, RefreshTask};

type Registry = Arc<RwLock<HashMap<Uuid, RefreshRecord>>>;

/// Finished records kept by default for inspection through the handle.
pub const DEFAULT_FINISHED_RETENTION: usize = 64;

/// Drops the oldest finished records until at most `keep` remain.
fn prune_finished(registry: &mut HashMap<Uuid, RefreshRecord>, keep: usize) {
    let mut finished: Vec<_> = registry
        .values()
        .filter(|record| record.is_finished())
        .map(|record| (record.finished_at, record.task_id))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort_unstable();
    let excess = finished.len() - keep;
    for (_, task_id) in finished.into_iter().take(excess) {
        registry.remove(&task_id);
    }
}

/// Handle used to submit refreshes to a running [`RefreshRuntime`].
#[derive(Clone)]
pub struct RefreshHandle {
    scheduler: RefreshScheduler,
    registry: Registry,
    notify: Arc<Notify>,
    shutting_down: Arc<AtomicBool>,
    retention: usize,
}

impl RefreshHandle {
    pub fn submit(&self, task: RefreshTask) -> Result<Uuid, EngineError> {
        if self.shutting_down.load(Ordering::Relaxed) {
            return Err(EngineError::ShuttingDown);
        }

        let task_id = task.id;
        self.registry.write().insert(task_id, RefreshRecord::new(&task));
        self.scheduler.enqueue(task);
        self.notify.notify_one();
        Ok(task_id)
    }

    /// Record of a refresh. Finished records are kept up to the runtime's
    /// retention, oldest first out.
    pub fn get(&self, task_id: &Uuid) -> Result<RefreshRecord, EngineError> {
        self.registry
            .read()
            .get(task_id)
            .cloned()
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))
    }

    pub fn list_for_timeline(&self, timeline_id: TimelineId) -> Vec<RefreshRecord> {
        self.registry
            .read()
            .values()
            .filter(|record| record.timeline_id == timeline_id)
            .cloned()
            .collect()
    }

    /// Removes a finished record. Records still queued or running are kept.
    pub fn forget(&self, task_id: &Uuid) -> Option<RefreshRecord> {
        let mut registry = self.registry.write();
        if !registry.get(task_id)?.is_finished() {
            return None;
        }
        registry.remove(task_id)
    }

    /// Cancels the queued refreshes of a timeline. Refreshes already running
    /// still deliver an outcome, which the owner drops if the timeline is gone.
    pub fn cancel_timeline(&self, timeline_id: TimelineId) -> usize {
        let cancelled = self.scheduler.cancel_timeline(timeline_id);
        let mut registry = self.registry.write();
        for task in &cancelled {
            if let Some(record) = registry.get_mut(&task.id) {
                record.status = RefreshStatus::Cancelled;
                record.finished_at = Some(chrono::Utc::now());
            }
        }
        prune_finished(&mut registry, self.retention);
        cancelled.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }
}

/// Pool of workers executing timeline fetches.
pub struct RefreshRuntime {
    scheduler: RefreshScheduler,
    registry: Registry,
    notify: Arc<Notify>,
    shutting_down: Arc<AtomicBool>,
    outcomes: mpsc::UnboundedSender<RefreshOutcome>,
    workers: Vec<JoinHandle<()>>,
    retention: usize,
}

impl RefreshRuntime {
    /// Creates the runtime and the receiving end of its outcome channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RefreshOutcome>) {
        Self::with_retention(DEFAULT_FINISHED_RETENTION)
    }

    /// Like [`RefreshRuntime::new`], keeping at most `retention` finished
    /// records in the registry.
    pub fn with_retention(retention: usize) -> (Self, mpsc::UnboundedReceiver<RefreshOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let runtime = Self {
            scheduler: RefreshScheduler::new(),
            registry: Arc::new(RwLock::new(HashMap::new())),
            notify: Arc::new(Notify::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
            outcomes,
            workers: Vec::new(),
            retention,
        };
        (runtime, receiver)
    }

    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            scheduler: self.scheduler.clone(),
            registry: self.registry.clone(),
            notify: self.notify.clone(),
            shutting_down: self.shutting_down.clone(),
            retention: self.retention,
        }
    }

    /// Spawns `worker_count` workers (at least one) on the current tokio runtime.
    pub fn start(&mut self, worker_count: usize) {
        let worker_count = worker_count.max(1);
        for worker_index in 0..worker_count {
            let worker = Worker {
                index: worker_index,
                scheduler: self.scheduler.clone(),
                registry: self.registry.clone(),
                notify: self.notify.clone(),
                shutting_down: self.shutting_down.clone(),
                outcomes: self.outcomes.clone(),
                retention: self.retention,
            };
            self.workers.push(tokio::spawn(worker.run()));
        }
        info!(workers = worker_count, "refresh runtime started");
    }

    /// Stops accepting work and waits for the workers to finish their
    /// current fetch. Queued refreshes are not executed.
    pub async fn shutdown(self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
        for handle in self.workers {
            if let Err(err) = handle.await {
                error!("refresh worker crashed: {:?}", err);
            }
        }
        info!("refresh runtime stopped");
    }
}

struct Worker {
    index: usize,
    scheduler: RefreshScheduler,
    registry: Registry,
    notify: Arc<Notify>,
    shutting_down: Arc<AtomicBool>,
    outcomes: mpsc::UnboundedSender<RefreshOutcome>,
    retention: usize,
}

impl Worker {
    async fn run(self) {
        while let Some(task) = self.next_task().await {
            self.execute(task).await;
        }
        debug!(worker = self.index, "refresh worker exiting");
    }

    async fn next_task(&self) -> Option<RefreshTask> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shutting_down.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(task) = self.scheduler.next_task() {
                return Some(task);
            }

            notified.await;
        }
    }

    async fn execute(&self, task: RefreshTask) {
        let started_at = chrono::Utc::now();
        if let Some(record) = self.registry.write().get_mut(&task.id) {
            record.status = RefreshStatus::Running;
            record.started_at = Some(started_at);
        }

        debug!(
            worker = self.index,
            task_id = %task.id,
            timeline = %task.timeline_name,
            kind = %task.request.kind(),
            "refreshing timeline"
        );

        let outcome = match task.request.execute().await {
            Ok(messages) => RefreshOutcome::success(&task, started_at, messages),
            Err(err) => RefreshOutcome::failure(&task, started_at, err),
        };

        {
            let mut registry = self.registry.write();
            if let Some(record) = registry.get_mut(&task.id) {
                record.status = outcome.status;
                record.finished_at = Some(outcome.finished_at);
                match &outcome.result {
                    Ok(messages) => record.fetched = Some(messages.len()),
                    Err(err) => record.last_error = Some(err.to_string()),
                }
            }
            prune_finished(&mut registry, self.retention);
        }

        if let Err(err) = &outcome.result {
            warn!(
                task_id = %task.id,
                timeline = %task.timeline_name,
                error = %err,
                "refresh failed"
            );
        }

        if self.outcomes.send(outcome).is_err() {
            debug!(task_id = %task.id, "outcome receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::RefreshPriority;
    use std::time::Duration;
    use twine_protocol::message::{Message, Status, User};
    use twine_timeline::{FetchError, FetchKind, FetchParams, FnSource, UpdateDescriptor};

    fn task_for(timeline_id: TimelineId, kind: FetchKind) -> RefreshTask {
        let source = Arc::new(FnSource::new(|kind: &FetchKind, _: &FetchParams| match kind {
            FetchKind::Mentions => Err(FetchError::Network("timed out".into())),
            _ => Ok(vec![Message::from(
                Status::builder(1, User::new(1, "alice")).text("hi").build(),
            )]),
        }));
        let request = UpdateDescriptor::new(source, kind).request(&FetchParams::default());
        RefreshTask::builder(timeline_id, request)
            .timeline_name("test")
            .priority(RefreshPriority::UserInitiated)
            .build()
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<RefreshOutcome>) -> RefreshOutcome {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("outcome in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn delivers_outcomes_over_the_channel() {
        let (mut runtime, mut rx) = RefreshRuntime::new();
        runtime.start(2);
        let handle = runtime.handle();

        let home = TimelineId::new();
        let mentions = TimelineId::new();
        let home_task = handle.submit(task_for(home, FetchKind::Home)).unwrap();
        handle.submit(task_for(mentions, FetchKind::Mentions)).unwrap();

        let mut outcomes = vec![recv(&mut rx).await, recv(&mut rx).await];
        outcomes.sort_by_key(|outcome| outcome.timeline_id != home);

        assert_eq!(outcomes[0].status, RefreshStatus::Completed);
        assert_eq!(outcomes[0].result.as_ref().map(Vec::len), Ok(1));
        assert_eq!(outcomes[1].status, RefreshStatus::Failed);
        assert!(outcomes[1].result.is_err());

        let record = handle.get(&home_task).unwrap();
        assert_eq!(record.fetched, Some(1));
        assert!(record.is_finished());
        assert_eq!(handle.list_for_timeline(mentions).len(), 1);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn rejects_work_after_shutdown() {
        let (mut runtime, _rx) = RefreshRuntime::new();
        runtime.start(1);
        let handle = runtime.handle();
        runtime.shutdown().await;

        assert!(handle.is_shutting_down());
        let err = handle
            .submit(task_for(TimelineId::new(), FetchKind::Home))
            .unwrap_err();
        assert!(matches!(err, EngineError::ShuttingDown));
    }

    #[tokio::test]
    async fn cancelled_refreshes_are_marked() {
        let (runtime, _rx) = RefreshRuntime::new();
        let handle = runtime.handle();
        let timeline = TimelineId::new();
        let task_id = handle.submit(task_for(timeline, FetchKind::Home)).unwrap();

        assert_eq!(handle.cancel_timeline(timeline), 1);
        assert_eq!(handle.pending_tasks(), 0);
        assert_eq!(handle.get(&task_id).unwrap().status, RefreshStatus::Cancelled);
    }

    #[tokio::test]
    async fn finished_records_are_bounded_by_retention() {
        let (mut runtime, mut rx) = RefreshRuntime::with_retention(8);
        runtime.start(2);
        let handle = runtime.handle();
        let timeline = TimelineId::new();

        for _ in 0..200 {
            handle.submit(task_for(timeline, FetchKind::Home)).unwrap();
        }
        for _ in 0..200 {
            recv(&mut rx).await;
        }

        let records = handle.list_for_timeline(timeline);
        assert_eq!(records.len(), 8);
        assert!(records.iter().all(RefreshRecord::is_finished));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn forget_only_drops_finished_records() {
        let (mut runtime, mut rx) = RefreshRuntime::new();
        let handle = runtime.handle();
        let timeline = TimelineId::new();
        let task_id = handle.submit(task_for(timeline, FetchKind::Home)).unwrap();
        assert!(handle.forget(&task_id).is_none());

        runtime.start(1);
        recv(&mut rx).await;
        assert_eq!(handle.forget(&task_id).map(|record| record.task_id), Some(task_id));
        assert!(matches!(handle.get(&task_id), Err(EngineError::TaskNotFound(_))));
        assert!(handle.list_for_timeline(timeline).is_empty());

        runtime.shutdown().await;
    }
}
