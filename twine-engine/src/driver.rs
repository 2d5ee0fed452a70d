//! Owner-side glue between a [`VisibleTimelineList`] and the refresh engine.

use tracing::debug;
use twine_timeline::{
    FetchError, FetchParams, MergeReport, Timeline, TimelineId, VisibleTimelineList,
};
use uuid::Uuid;

use crate::error::EngineError;
use crate::runtime::RefreshHandle;
use crate::task::{RefreshOutcome, RefreshPriority, RefreshTask};

/// What happened to an outcome once it reached the owner.
#[derive(Debug)]
pub enum AppliedOutcome {
    Merged(MergeReport),
    Failed(FetchError),
    /// The timeline was deleted while the fetch was in flight.
    Dropped,
}

/// Schedules a refresh of every timeline bound to a source.
pub fn submit_refresh_all(
    handle: &RefreshHandle,
    list: &VisibleTimelineList,
    priority: RefreshPriority,
    overrides: &FetchParams,
) -> Result<Vec<Uuid>, EngineError> {
    list.refresh_requests(overrides)
        .into_iter()
        .map(|(timeline_id, request)| {
            let name = list
                .get_by_id(timeline_id)
                .map(|timeline| timeline.name().to_string())
                .unwrap_or_default();
            handle.submit(
                RefreshTask::builder(timeline_id, request)
                    .timeline_name(name)
                    .priority(priority)
                    .build(),
            )
        })
        .collect()
}

/// Schedules a refresh of one timeline.
pub fn submit_refresh(
    handle: &RefreshHandle,
    list: &VisibleTimelineList,
    timeline_id: TimelineId,
    priority: RefreshPriority,
    overrides: &FetchParams,
) -> Result<Uuid, EngineError> {
    let timeline = list
        .get_by_id(timeline_id)
        .ok_or_else(|| EngineError::TimelineNotFound(timeline_id.to_string()))?;
    let request = timeline
        .fetch_request(overrides)
        .map_err(|err| EngineError::Rejected(err.to_string()))?;

    handle.submit(
        RefreshTask::builder(timeline_id, request)
            .timeline_name(timeline.name())
            .priority(priority)
            .build(),
    )
}

/// Merges a finished refresh into `list`.
pub fn apply_outcome(list: &mut VisibleTimelineList, outcome: RefreshOutcome) -> AppliedOutcome {
    let RefreshOutcome {
        task_id,
        timeline_id,
        timeline_name,
        result,
        ..
    } = outcome;

    match result {
        Ok(messages) => match list.merge_into(timeline_id, messages) {
            Some(report) => AppliedOutcome::Merged(report),
            None => {
                debug!(
                    %task_id,
                    timeline = %timeline_name,
                    "timeline gone, dropping refresh result"
                );
                AppliedOutcome::Dropped
            }
        },
        Err(error) => {
            if list.get_by_id(timeline_id).is_none() {
                return AppliedOutcome::Dropped;
            }
            debug!(%task_id, timeline = %timeline_name, error = %error, "refresh failure applied");
            AppliedOutcome::Failed(error)
        }
    }
}

/// Deletes the active timeline and cancels its queued refreshes.
pub fn delete_active_timeline(
    handle: &RefreshHandle,
    list: &mut VisibleTimelineList,
) -> Option<Timeline> {
    let removed = list.delete_active_timeline()?;
    let cancelled = handle.cancel_timeline(removed.id());
    if cancelled > 0 {
        debug!(timeline = %removed.name(), cancelled, "cancelled queued refreshes");
    }
    Some(removed)
}
