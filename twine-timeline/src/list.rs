use tracing::{debug, warn};
use twine_protocol::message::Message;

use crate::active_list::sealed::{CursorOwner, Token};
use crate::active_list::{ActiveList, Cursor};
use crate::error::TimelineError;
use crate::fetch::{FetchParams, FetchRequest};
use crate::timeline::{MergeReport, Timeline, TimelineId};

/// A timeline whose refresh failed during [`TimelineList::update_all`].
#[derive(Debug)]
pub struct UpdateFailure {
    pub timeline_id: TimelineId,
    pub timeline_name: String,
    pub error: TimelineError,
}

/// Outcome of a best-effort refresh of every timeline.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub merged: Vec<(TimelineId, MergeReport)>,
    pub failures: Vec<UpdateFailure>,
}

impl UpdateSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered, user-arranged list of timelines with an active one.
#[derive(Debug, Default)]
pub struct TimelineList {
    timelines: Vec<Timeline>,
    cursor: Cursor,
}

impl TimelineList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_timeline(&mut self, timeline: Timeline) {
        self.timelines.push(timeline);
        if self.cursor.is_null() {
            self.cursor.first(self.timelines.len());
        }
    }

    pub fn has_timelines(&self) -> bool {
        !self.timelines.is_empty() && !self.cursor.is_null()
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Timeline> {
        self.timelines.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Timeline> {
        self.timelines.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Timeline> {
        self.timelines.get_mut(index)
    }

    pub fn position(&self, id: TimelineId) -> Option<usize> {
        self.timelines.iter().position(|timeline| timeline.id() == id)
    }

    pub fn get_by_id(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.iter().find(|timeline| timeline.id() == id)
    }

    pub fn get_by_id_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.iter_mut().find(|timeline| timeline.id() == id)
    }

    pub fn get_active_timeline(&self) -> Result<&Timeline, TimelineError> {
        self.cursor
            .index()
            .and_then(|index| self.timelines.get(index))
            .ok_or(TimelineError::EmptyCollection("timeline list"))
    }

    pub fn get_active_timeline_mut(&mut self) -> Result<&mut Timeline, TimelineError> {
        match self.cursor.index() {
            Some(index) => self
                .timelines
                .get_mut(index)
                .ok_or(TimelineError::EmptyCollection("timeline list")),
            None => Err(TimelineError::EmptyCollection("timeline list")),
        }
    }

    pub fn get_active_timeline_name(&self) -> Result<&str, TimelineError> {
        self.get_active_timeline().map(Timeline::name)
    }

    pub fn get_timeline_names(&self) -> Vec<&str> {
        self.timelines.iter().map(Timeline::name).collect()
    }

    /// Activates the timeline at `index` if it exists.
    pub fn activate_index(&mut self, index: usize) -> bool {
        let len = self.timelines.len();
        self.cursor.select(index, len)
    }

    /// Swaps the active timeline with its left neighbour; it stays active.
    pub fn shift_active_previous(&mut self) {
        if let Some(index) = self.cursor.index() {
            if index > 0 {
                self.timelines.swap(index, index - 1);
                self.cursor.previous(self.timelines.len());
            }
        }
    }

    /// Swaps the active timeline with its right neighbour; it stays active.
    pub fn shift_active_next(&mut self) {
        if let Some(index) = self.cursor.index() {
            if index + 1 < self.timelines.len() {
                self.timelines.swap(index, index + 1);
                self.cursor.next(self.timelines.len());
            }
        }
    }

    /// Moves the active timeline to the front, keeping the others in order.
    pub fn shift_active_beginning(&mut self) {
        if let Some(index) = self.cursor.index() {
            let timeline = self.timelines.remove(index);
            self.timelines.insert(0, timeline);
            self.cursor.first(self.timelines.len());
        }
    }

    /// Moves the active timeline to the back, keeping the others in order.
    pub fn shift_active_end(&mut self) {
        if let Some(index) = self.cursor.index() {
            let timeline = self.timelines.remove(index);
            self.timelines.push(timeline);
            self.cursor.last(self.timelines.len());
        }
    }

    /// Removes the active timeline. The timeline that took its place becomes
    /// active, or the new last one when the removed timeline was last.
    pub fn delete_active_timeline(&mut self) -> Option<Timeline> {
        let index = self.cursor.index()?;
        let removed = self.timelines.remove(index);
        self.cursor.removed(index, self.timelines.len());
        debug!(timeline = %removed.name(), timeline_id = %removed.id(), "deleted timeline");
        Some(removed)
    }

    /// Refreshes the active timeline.
    pub async fn update_active(&mut self) -> Result<MergeReport, TimelineError> {
        self.get_active_timeline_mut()?.update().await
    }

    /// Refreshes every timeline in order. A failing timeline does not stop
    /// the others; failures are collected in the summary.
    pub async fn update_all(&mut self) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for timeline in &mut self.timelines {
            match timeline.update().await {
                Ok(report) => summary.merged.push((timeline.id(), report)),
                Err(error) => {
                    warn!(timeline = %timeline.name(), error = %error, "timeline refresh failed");
                    summary.failures.push(UpdateFailure {
                        timeline_id: timeline.id(),
                        timeline_name: timeline.name().to_string(),
                        error,
                    });
                }
            }
        }

        summary
    }

    /// Detached fetches for every timeline bound to a source, so they can run
    /// off the owning task. `overrides` apply to each request.
    pub fn refresh_requests(&self, overrides: &FetchParams) -> Vec<(TimelineId, FetchRequest)> {
        self.timelines
            .iter()
            .filter_map(|timeline| match timeline.fetch_request(overrides) {
                Ok(request) => Some((timeline.id(), request)),
                Err(_) => {
                    debug!(timeline = %timeline.name(), "skipping timeline without update source");
                    None
                }
            })
            .collect()
    }

    /// Merges messages fetched off-thread for the timeline `id`.
    ///
    /// Returns `None`, dropping the messages, when the timeline was deleted
    /// while the fetch was in flight.
    pub fn merge_into(&mut self, id: TimelineId, messages: Vec<Message>) -> Option<MergeReport> {
        match self.get_by_id_mut(id) {
            Some(timeline) => Some(timeline.merge_fetched(messages)),
            None => {
                debug!(timeline_id = %id, "dropping messages for deleted timeline");
                None
            }
        }
    }
}

impl CursorOwner for TimelineList {
    fn cursor_mut(&mut self, _: Token) -> &mut Cursor {
        &mut self.cursor
    }
}

impl ActiveList for TimelineList {
    fn len(&self) -> usize {
        self.timelines.len()
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl<'a> IntoIterator for &'a TimelineList {
    type Item = &'a Timeline;
    type IntoIter = std::slice::Iter<'a, Timeline>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchKind, FnSource, UpdateDescriptor};
    use chrono::Utc;
    use std::sync::Arc;
    use twine_protocol::message::{Status, User};

    fn names(list: &TimelineList) -> Vec<&str> {
        list.get_timeline_names()
    }

    fn list_of(names: &[&str]) -> TimelineList {
        let mut list = TimelineList::new();
        for name in names {
            list.append_timeline(Timeline::new(*name));
        }
        list
    }

    fn status(id: u64) -> Message {
        Status::builder(id, User::new(1, "alice"))
            .created_at(Utc::now())
            .build()
            .into()
    }

    #[test]
    fn empty_list_has_no_active_timeline() {
        let mut list = TimelineList::new();
        assert!(!list.has_timelines());
        assert!(matches!(
            list.get_active_timeline(),
            Err(TimelineError::EmptyCollection(_))
        ));
        assert!(list.get_active_timeline_name().is_err());

        list.activate_previous();
        list.activate_next();
        list.activate_first();
        list.activate_last();
        list.shift_active_previous();
        list.shift_active_next();
        list.shift_active_beginning();
        list.shift_active_end();
        assert!(list.delete_active_timeline().is_none());
        assert_eq!(list.active_index(), None);
    }

    #[test]
    fn first_append_activates() {
        let mut list = TimelineList::new();
        list.append_timeline(Timeline::new("home"));
        assert!(list.has_timelines());
        assert_eq!(list.active_index(), Some(0));

        list.append_timeline(Timeline::new("mentions"));
        assert_eq!(list.active_index(), Some(0));
        assert_eq!(list.get_active_timeline_name().unwrap(), "home");
    }

    #[test]
    fn single_timeline_cursor_never_moves() {
        let mut list = list_of(&["home"]);
        list.activate_previous();
        assert_eq!(list.active_index(), Some(0));
        list.activate_next();
        assert_eq!(list.active_index(), Some(0));
    }

    #[test]
    fn cursor_walks_without_wrapping() {
        let mut list = list_of(&["a", "b", "c"]);
        list.activate_next();
        list.activate_next();
        assert_eq!(list.active_index(), Some(2));

        list.activate_previous();
        list.activate_previous();
        list.activate_previous();
        assert_eq!(list.active_index(), Some(0));
    }

    #[test]
    fn shifting_moves_timeline_with_cursor() {
        let mut list = list_of(&["a", "b", "c"]);
        list.shift_active_next();
        assert_eq!(names(&list), vec!["b", "a", "c"]);
        assert_eq!(list.get_active_timeline_name().unwrap(), "a");

        list.shift_active_next();
        list.shift_active_next();
        assert_eq!(names(&list), vec!["b", "c", "a"]);
        assert_eq!(list.active_index(), Some(2));

        list.shift_active_previous();
        assert_eq!(names(&list), vec!["b", "a", "c"]);
        assert_eq!(list.active_index(), Some(1));
    }

    #[test]
    fn shifting_to_edges_preserves_relative_order() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.activate_index(2);
        list.shift_active_beginning();
        assert_eq!(names(&list), vec!["c", "a", "b", "d"]);
        assert_eq!(list.active_index(), Some(0));

        list.activate_index(1);
        list.shift_active_end();
        assert_eq!(names(&list), vec!["c", "b", "d", "a"]);
        assert_eq!(list.active_index(), Some(3));
        assert_eq!(list.get_active_timeline_name().unwrap(), "a");
    }

    #[test]
    fn out_of_range_activation_is_refused() {
        let mut list = list_of(&["a", "b"]);
        assert!(!list.activate_index(2));
        assert_eq!(list.active_index(), Some(0));

        list.activate_last();
        list.activate_next();
        list.shift_active_next();
        list.shift_active_previous();
        assert_eq!(names(&list), vec!["b", "a"]);
        assert_eq!(list.active_index(), Some(0));
        assert_eq!(list.get_active_timeline_name().unwrap(), "a");
    }

    #[test]
    fn deleting_active_reindexes() {
        let mut list = list_of(&["a", "b", "c"]);
        list.activate_index(1);

        let removed = list.delete_active_timeline();
        assert_eq!(removed.as_ref().map(Timeline::name), Some("b"));
        assert_eq!(names(&list), vec!["a", "c"]);
        assert_eq!(list.active_index(), Some(1));

        list.delete_active_timeline();
        assert_eq!(names(&list), vec!["a"]);
        assert_eq!(list.active_index(), Some(0));

        list.delete_active_timeline();
        assert!(names(&list).is_empty());
        assert_eq!(list.active_index(), None);
        assert!(!list.has_timelines());
    }

    #[test]
    fn merge_into_deleted_timeline_is_dropped() {
        let mut list = list_of(&["a"]);
        let id = list.get_active_timeline().unwrap().id();
        assert_eq!(list.merge_into(id, vec![status(1)]).map(|r| r.inserted), Some(1));

        list.delete_active_timeline();
        assert!(list.merge_into(id, vec![status(2)]).is_none());
    }

    #[tokio::test]
    async fn update_all_is_best_effort() {
        let ok = Arc::new(FnSource::new(|_, _| Ok(vec![status(1), status(2)])));
        let failing = Arc::new(FnSource::new(|_, _| {
            Err(FetchError::Remote {
                status: 503,
                message: "over capacity".into(),
            })
        }));

        let mut list = TimelineList::new();
        list.append_timeline(Timeline::with_update(
            "failing",
            UpdateDescriptor::new(failing, FetchKind::Mentions),
        ));
        list.append_timeline(Timeline::new("unbound"));
        list.append_timeline(Timeline::with_update(
            "home",
            UpdateDescriptor::new(ok, FetchKind::Home),
        ));

        let summary = list.update_all().await;

        assert!(!summary.is_success());
        assert_eq!(summary.failures.len(), 2);
        assert!(summary.failures[0].error.is_fetch());
        assert!(matches!(summary.failures[1].error, TimelineError::Configuration(_)));
        assert_eq!(summary.merged.len(), 1);
        assert_eq!(list.get(2).map(|t| t.len()), Some(2));
    }

    #[test]
    fn refresh_requests_skip_unbound_timelines() {
        let source = Arc::new(FnSource::new(|_, _| Ok(Vec::new())));
        let mut list = list_of(&["unbound"]);
        list.append_timeline(Timeline::with_update(
            "search",
            UpdateDescriptor::new(source, FetchKind::Search { query: "rust".into() }),
        ));

        let requests = list.refresh_requests(&FetchParams::default().with_count(5));
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.params().count, Some(5));
        assert_eq!(requests[0].0, list.get(1).unwrap().id());
    }
}
