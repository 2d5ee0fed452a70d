use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use twine_engine::{
    apply_outcome, submit_refresh, AppliedOutcome, EngineError, RefreshHandle, RefreshOutcome,
    RefreshPriority,
};
use twine_timeline::{FetchParams, VisibleTimelineList};

/// What one refresh round did to the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub submitted: usize,
    pub inserted: usize,
    pub failed: usize,
    pub dropped: usize,
}

/// Refreshes every bound timeline once and merges the results.
///
/// With `newer_only`, each timeline only asks for messages newer than the
/// newest one it holds.
pub async fn run_round(
    list: &mut VisibleTimelineList,
    handle: &RefreshHandle,
    outcomes: &mut UnboundedReceiver<RefreshOutcome>,
    priority: RefreshPriority,
    newer_only: bool,
) -> Result<RoundSummary, EngineError> {
    let targets: Vec<_> = list
        .timelines()
        .iter()
        .filter(|timeline| timeline.has_update_source())
        .map(|timeline| {
            let overrides = match timeline.newest_id() {
                Some(newest) if newer_only => FetchParams::since(newest),
                _ => FetchParams::default(),
            };
            (timeline.id(), overrides)
        })
        .collect();

    let mut summary = RoundSummary::default();
    for (timeline_id, overrides) in &targets {
        submit_refresh(handle, list, *timeline_id, priority, overrides)?;
        summary.submitted += 1;
    }

    for _ in 0..summary.submitted {
        let Some(outcome) = outcomes.recv().await else {
            warn!("refresh runtime closed before the round finished");
            break;
        };
        match apply_outcome(list, outcome) {
            AppliedOutcome::Merged(report) => summary.inserted += report.inserted,
            AppliedOutcome::Failed(_) => summary.failed += 1,
            AppliedOutcome::Dropped => summary.dropped += 1,
        }
    }

    info!(
        submitted = summary.submitted,
        inserted = summary.inserted,
        failed = summary.failed,
        dropped = summary.dropped,
        "refresh round finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplaySource;
    use std::sync::Arc;
    use twine_core::SessionConfig;
    use twine_engine::RefreshRuntime;
    use twine_timeline::{build_session, ActiveList, SourceTimelineFactory};

    const RECORDING: &str = r#"{
        "home": [
            {"type": "status", "id": 2, "created_at": "2024-03-01T10:01:00Z",
             "author": {"id": 1, "screen_name": "alice"}, "text": "hello @bob"},
            {"type": "status", "id": 1, "created_at": "2024-03-01T10:00:00Z",
             "author": {"id": 2, "screen_name": "bob"}, "text": "morning"}
        ],
        "mentions": [
            {"type": "status", "id": 2, "created_at": "2024-03-01T10:01:00Z",
             "author": {"id": 1, "screen_name": "alice"}, "text": "hello @bob"}
        ]
    }"#;

    #[tokio::test]
    async fn round_fills_session_and_counts_hidden_unread() {
        let source = Arc::new(ReplaySource::from_json(RECORDING).unwrap());
        let factory = SourceTimelineFactory::new(source);
        let config = SessionConfig {
            visible: "home".into(),
            buffers: "mentions, favorites".into(),
        };
        let mut list = build_session(&config, &factory);

        let (mut runtime, mut rx) = RefreshRuntime::new();
        runtime.start(2);
        let handle = runtime.handle();

        let first = run_round(&mut list, &handle, &mut rx, RefreshPriority::UserInitiated, false)
            .await
            .unwrap();
        assert_eq!(first.submitted, 3);
        assert_eq!(first.inserted, 3);
        assert_eq!(first.failed, 0);
        assert_eq!(list.get_unread_counts(), vec![0, 1, 0]);

        let second = run_round(&mut list, &handle, &mut rx, RefreshPriority::Periodic, true)
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(list.get(0).unwrap().len(), 2);

        list.activate_index(1);
        assert_eq!(list.get_unread_counts(), vec![0, 0, 0]);

        runtime.shutdown().await;
    }
}
