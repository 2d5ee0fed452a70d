use std::collections::HashMap;

use tracing::debug;
use twine_protocol::message::{Message, MessageId};

use crate::active_list::sealed::{CursorOwner, Token};
use crate::active_list::{ActiveList, Cursor};
use crate::error::TimelineError;
use crate::fetch::{FetchParams, FetchRequest};
use crate::list::{TimelineList, UpdateSummary};
use crate::timeline::{MergeReport, Timeline, TimelineId};

/// Contiguous inclusive range of displayed timeline indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: usize,
    end: usize,
}

impl Window {
    fn single(index: usize) -> Self {
        Window {
            start: index,
            end: index,
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Timeline list with a window of timelines displayed side by side.
///
/// Whenever timelines exist, the active timeline lies inside the visible
/// window and the window lies inside the list. Unread counts are kept per
/// timeline: messages newer than what a timeline held are unread when they
/// arrive while the timeline is neither active nor visible, and a timeline's
/// count resets when it becomes active or is marked as read.
#[derive(Debug, Default)]
pub struct VisibleTimelineList {
    list: TimelineList,
    window: Option<Window>,
    unread: HashMap<TimelineId, usize>,
    read_marks: HashMap<TimelineId, MessageId>,
}

impl VisibleTimelineList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing list; only its active timeline starts visible.
    pub fn from_list(list: TimelineList) -> Self {
        let unread = list.iter().map(|timeline| (timeline.id(), 0)).collect();
        let window = list.active_index().map(Window::single);
        Self {
            list,
            window,
            unread,
            read_marks: HashMap::new(),
        }
    }

    pub fn list(&self) -> &TimelineList {
        &self.list
    }

    pub fn timelines(&self) -> &[Timeline] {
        self.list.timelines()
    }

    pub fn get(&self, index: usize) -> Option<&Timeline> {
        self.list.get(index)
    }

    pub fn get_by_id(&self, id: TimelineId) -> Option<&Timeline> {
        self.list.get_by_id(id)
    }

    pub fn has_timelines(&self) -> bool {
        self.list.has_timelines()
    }

    pub fn get_active_timeline(&self) -> Result<&Timeline, TimelineError> {
        self.list.get_active_timeline()
    }

    /// Mutable access to the active timeline, for scrolling its messages.
    pub fn get_active_timeline_mut(&mut self) -> Result<&mut Timeline, TimelineError> {
        self.list.get_active_timeline_mut()
    }

    pub fn get_active_timeline_name(&self) -> Result<&str, TimelineError> {
        self.list.get_active_timeline_name()
    }

    pub fn get_timeline_names(&self) -> Vec<&str> {
        self.list.get_timeline_names()
    }

    pub fn append_timeline(&mut self, timeline: Timeline) {
        self.unread.insert(timeline.id(), 0);
        self.list.append_timeline(timeline);
        self.settle();
    }

    pub fn activate_index(&mut self, index: usize) -> bool {
        let activated = self.list.activate_index(index);
        self.settle();
        activated
    }

    pub fn shift_active_previous(&mut self) {
        self.list.shift_active_previous();
        self.settle();
    }

    pub fn shift_active_next(&mut self) {
        self.list.shift_active_next();
        self.settle();
    }

    pub fn shift_active_beginning(&mut self) {
        self.list.shift_active_beginning();
        self.settle();
    }

    pub fn shift_active_end(&mut self) {
        self.list.shift_active_end();
        self.settle();
    }

    pub fn delete_active_timeline(&mut self) -> Option<Timeline> {
        let index = self.list.active_index()?;
        let removed = self.list.delete_active_timeline()?;
        self.unread.remove(&removed.id());
        self.read_marks.remove(&removed.id());

        self.window = self.window.and_then(|window| {
            if self.list.is_empty() {
                None
            } else if index < window.start {
                Some(Window {
                    start: window.start - 1,
                    end: window.end - 1,
                })
            } else if index <= window.end && window.end > window.start {
                Some(Window {
                    start: window.start,
                    end: window.end - 1,
                })
            } else {
                Some(window)
            }
        });
        self.settle();
        Some(removed)
    }

    /// Grows the visible window by one timeline to the left.
    pub fn expand_visible_previous(&mut self) {
        if let Some(window) = self.window.as_mut() {
            if window.start > 0 {
                window.start -= 1;
            }
        }
    }

    /// Grows the visible window by one timeline to the right.
    pub fn expand_visible_next(&mut self) {
        let len = self.list.len();
        if let Some(window) = self.window.as_mut() {
            if window.end + 1 < len {
                window.end += 1;
            }
        }
    }

    /// Drops the leftmost visible timeline unless it is the active one.
    pub fn shrink_visible_beginning(&mut self) {
        let active = self.list.active_index();
        if let Some(window) = self.window.as_mut() {
            if window.start < window.end && Some(window.start) != active {
                window.start += 1;
            }
        }
    }

    /// Drops the rightmost visible timeline unless it is the active one.
    pub fn shrink_visible_end(&mut self) {
        let active = self.list.active_index();
        if let Some(window) = self.window.as_mut() {
            if window.start < window.end && Some(window.end) != active {
                window.end -= 1;
            }
        }
    }

    /// Sets the visible window, clamped to the list. When the active timeline
    /// falls outside it, the window slides to contain it and keeps its width
    /// as far as the list allows.
    pub fn set_visible_range(&mut self, start: usize, end: usize) {
        if self.list.is_empty() {
            return;
        }
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.window = Some(Window { start, end });
        self.settle();
    }

    /// Inclusive `(start, end)` of the visible window.
    pub fn visible_indexes(&self) -> Option<(usize, usize)> {
        self.window.map(|window| (window.start, window.end))
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.window.map_or(false, |window| window.contains(index))
    }

    pub fn get_visible_timelines(&self) -> &[Timeline] {
        match self.window {
            Some(window) => &self.list.timelines()[window.start..=window.end],
            None => &[],
        }
    }

    /// Position of the active timeline among the visible ones.
    pub fn get_visible_timeline_relative_index(&self) -> Option<usize> {
        let window = self.window?;
        self.list
            .active_index()
            .map(|active| active - window.start)
    }

    /// Marks every message of the active timeline as read: its unread count
    /// drops to zero and its newest message becomes the read mark.
    pub fn mark_all_as_read(&mut self) {
        let Ok(timeline) = self.list.get_active_timeline() else {
            return;
        };
        let id = timeline.id();
        self.unread.insert(id, 0);
        if let Some(newest) = timeline.newest_id() {
            self.read_marks.insert(id, newest);
        }
    }

    /// Newest message of the timeline at `index` as of the last
    /// [`mark_all_as_read`](Self::mark_all_as_read) on it.
    pub fn last_read_id(&self, index: usize) -> Option<MessageId> {
        let timeline = self.list.get(index)?;
        self.read_marks.get(&timeline.id()).copied()
    }

    /// Unread counts, parallel to the timelines.
    pub fn get_unread_counts(&self) -> Vec<usize> {
        self.list
            .iter()
            .map(|timeline| self.unread.get(&timeline.id()).copied().unwrap_or(0))
            .collect()
    }

    pub fn get_unread_count(&self, index: usize) -> Option<usize> {
        self.list
            .get(index)
            .map(|timeline| self.unread.get(&timeline.id()).copied().unwrap_or(0))
    }

    pub fn total_unread(&self) -> usize {
        self.unread.values().sum()
    }

    pub fn refresh_requests(&self, overrides: &FetchParams) -> Vec<(TimelineId, FetchRequest)> {
        self.list.refresh_requests(overrides)
    }

    /// Merges messages fetched off-thread, updating unread counts. `None`
    /// means the timeline no longer exists and the messages were dropped.
    pub fn merge_into(&mut self, id: TimelineId, messages: Vec<Message>) -> Option<MergeReport> {
        let report = self.list.merge_into(id, messages)?;
        self.record_unread(id, report);
        Some(report)
    }

    pub async fn update_active(&mut self) -> Result<MergeReport, TimelineError> {
        self.list.update_active().await
    }

    /// Refreshes every timeline, see [`TimelineList::update_all`].
    pub async fn update_all(&mut self) -> UpdateSummary {
        let summary = self.list.update_all().await;
        for (id, report) in &summary.merged {
            self.record_unread(*id, *report);
        }
        summary
    }

    fn record_unread(&mut self, id: TimelineId, report: MergeReport) {
        let Some(index) = self.list.position(id) else {
            return;
        };
        if report.newer == 0 || self.list.active_index() == Some(index) || self.is_visible(index) {
            return;
        }
        *self.unread.entry(id).or_insert(0) += report.newer;
        debug!(timeline_id = %id, unread = self.unread[&id], "unread messages arrived");
    }

    /// Restores the window invariants after the active index or the length
    /// changed, then clears the unread count of the active timeline.
    fn settle(&mut self) {
        let len = self.list.len();
        let Some(active) = self.list.active_index() else {
            self.window = None;
            return;
        };

        let mut window = self.window.unwrap_or(Window::single(active));
        window.end = window.end.min(len - 1);
        window.start = window.start.min(window.end);

        if active < window.start {
            let width = window.width();
            window.start = active;
            window.end = (active + width).min(len - 1);
        } else if active > window.end {
            let width = window.width();
            window.end = active;
            window.start = active.saturating_sub(width);
        }

        self.window = Some(window);
        if let Some(timeline) = self.list.get(active) {
            self.unread.insert(timeline.id(), 0);
        }
    }
}

impl CursorOwner for VisibleTimelineList {
    fn cursor_mut(&mut self, token: Token) -> &mut Cursor {
        self.list.cursor_mut(token)
    }
}

impl ActiveList for VisibleTimelineList {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn cursor(&self) -> &Cursor {
        self.list.cursor()
    }

    fn activate_previous(&mut self) {
        self.list.activate_previous();
        self.settle();
    }

    fn activate_next(&mut self) {
        self.list.activate_next();
        self.settle();
    }

    fn activate_first(&mut self) {
        self.list.activate_first();
        self.settle();
    }

    fn activate_last(&mut self) {
        self.list.activate_last();
        self.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use twine_protocol::message::{Status, User};

    fn list_of(names: &[&str]) -> VisibleTimelineList {
        let mut list = VisibleTimelineList::new();
        for name in names {
            list.append_timeline(Timeline::new(*name));
        }
        list
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn status(id: u64, minutes: i64) -> Message {
        Status::builder(id, User::new(1, "alice"))
            .created_at(base_time() + Duration::minutes(minutes))
            .build()
            .into()
    }

    fn visible_names(list: &VisibleTimelineList) -> Vec<&str> {
        list.get_visible_timelines().iter().map(Timeline::name).collect()
    }

    fn assert_invariants(list: &VisibleTimelineList) {
        match (list.active_index(), list.visible_indexes()) {
            (None, None) => assert!(list.is_empty()),
            (Some(active), Some((start, end))) => {
                assert!(start <= active && active <= end);
                assert!(end < list.len());
            }
            other => panic!("inconsistent state: {:?}", other),
        }
    }

    #[test]
    fn empty_list_has_no_window() {
        let mut list = VisibleTimelineList::new();
        list.expand_visible_next();
        list.expand_visible_previous();
        list.shrink_visible_beginning();
        list.shrink_visible_end();
        list.activate_next();
        list.mark_all_as_read();
        assert_eq!(list.visible_indexes(), None);
        assert!(list.get_visible_timelines().is_empty());
        assert_eq!(list.get_visible_timeline_relative_index(), None);
        assert_invariants(&list);
    }

    #[test]
    fn first_timeline_is_the_only_visible_one() {
        let list = list_of(&["a", "b", "c"]);
        assert_eq!(list.visible_indexes(), Some((0, 0)));
        assert_eq!(visible_names(&list), vec!["a"]);
    }

    #[test]
    fn expands_until_the_edges() {
        let mut list = list_of(&["a", "b", "c"]);
        list.expand_visible_previous();
        assert_eq!(list.visible_indexes(), Some((0, 0)));

        list.expand_visible_next();
        list.expand_visible_next();
        list.expand_visible_next();
        assert_eq!(list.visible_indexes(), Some((0, 2)));
        assert_eq!(visible_names(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn shrinking_never_hides_the_active_timeline() {
        let mut list = list_of(&["a", "b", "c"]);
        list.set_visible_range(0, 2);
        list.activate_index(2);

        list.shrink_visible_end();
        assert_eq!(list.visible_indexes(), Some((0, 2)));

        list.shrink_visible_beginning();
        list.shrink_visible_beginning();
        list.shrink_visible_beginning();
        assert_eq!(list.visible_indexes(), Some((2, 2)));
        assert_eq!(list.get_visible_timeline_relative_index(), Some(0));
    }

    #[test]
    fn relative_index_tracks_active_inside_window() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.set_visible_range(1, 3);
        assert_eq!(list.visible_indexes(), Some((0, 2)));

        list.activate_index(2);
        assert_eq!(list.get_visible_timeline_relative_index(), Some(2));

        list.set_visible_range(1, 3);
        assert_eq!(list.visible_indexes(), Some((1, 3)));
        assert_eq!(list.get_visible_timeline_relative_index(), Some(1));
    }

    #[test]
    fn window_slides_to_follow_activation() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.expand_visible_next();
        assert_eq!(list.visible_indexes(), Some((0, 1)));

        list.activate_next();
        assert_eq!(list.visible_indexes(), Some((0, 1)));
        list.activate_next();
        assert_eq!(list.visible_indexes(), Some((1, 2)));
        list.activate_last();
        assert_eq!(list.visible_indexes(), Some((2, 3)));
        list.activate_first();
        assert_eq!(list.visible_indexes(), Some((0, 1)));
        assert_invariants(&list);
    }

    #[test]
    fn shifting_keeps_active_visible() {
        let mut list = list_of(&["a", "b", "c"]);
        list.shift_active_end();
        assert_eq!(list.get_timeline_names(), vec!["b", "c", "a"]);
        assert_eq!(list.visible_indexes(), Some((2, 2)));

        list.shift_active_previous();
        assert_eq!(list.visible_indexes(), Some((1, 1)));
        list.shift_active_beginning();
        assert_eq!(list.visible_indexes(), Some((0, 0)));
        assert_invariants(&list);
    }

    #[test]
    fn deleting_shrinks_and_reclamps_window() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.set_visible_range(1, 3);
        list.activate_index(3);

        list.delete_active_timeline();
        assert_eq!(list.get_timeline_names(), vec!["a", "b", "c"]);
        assert_eq!(list.active_index(), Some(2));
        assert_eq!(list.visible_indexes(), Some((1, 2)));
        assert_invariants(&list);

        list.activate_index(0);
        assert_eq!(list.visible_indexes(), Some((0, 1)));
        list.delete_active_timeline();
        assert_eq!(list.get_timeline_names(), vec!["b", "c"]);
        assert_eq!(list.visible_indexes(), Some((0, 0)));
        assert_invariants(&list);

        list.delete_active_timeline();
        list.delete_active_timeline();
        assert_eq!(list.visible_indexes(), None);
        assert_invariants(&list);
    }

    #[test]
    fn unread_counts_grow_for_hidden_timelines_only() {
        let mut list = list_of(&["home", "mentions", "search"]);
        list.expand_visible_next();
        let ids: Vec<TimelineId> = list.timelines().iter().map(Timeline::id).collect();

        list.merge_into(ids[0], vec![status(1, 0), status(2, 1)]);
        list.merge_into(ids[1], vec![status(3, 0)]);
        list.merge_into(ids[2], vec![status(4, 0), status(5, 1)]);
        assert_eq!(list.get_unread_counts(), vec![0, 0, 2]);

        list.merge_into(ids[2], vec![status(5, 1), status(6, 2), status(7, -30)]);
        assert_eq!(list.get_unread_counts(), vec![0, 0, 3]);
        assert_eq!(list.total_unread(), 3);

        list.activate_index(2);
        assert_eq!(list.get_unread_count(2), Some(0));
    }

    #[test]
    fn message_in_same_second_as_newest_is_unread() {
        let mut list = list_of(&["home"]);
        list.append_timeline(Timeline::new("mentions").with_messages(vec![status(1, 0)]));
        let mentions = list.get(1).unwrap().id();

        let report = list.merge_into(mentions, vec![status(2, 0)]).unwrap();
        assert_eq!(report, MergeReport { inserted: 1, newer: 1 });
        assert_eq!(list.get_unread_counts(), vec![0, 1]);
    }

    #[test]
    fn activation_resets_count_and_hiding_resumes_counting() {
        let mut list = list_of(&["home", "mentions"]);
        let mentions = list.get(1).unwrap().id();
        list.merge_into(mentions, vec![status(1, 0)]);
        assert_eq!(list.get_unread_count(1), Some(1));

        list.activate_next();
        assert_eq!(list.get_unread_count(1), Some(0));
        list.merge_into(mentions, vec![status(2, 5)]);
        assert_eq!(list.get_unread_count(1), Some(0));

        list.activate_previous();
        assert_eq!(list.visible_indexes(), Some((0, 0)));
        list.merge_into(mentions, vec![status(3, 10)]);
        assert_eq!(list.get_unread_counts(), vec![0, 1]);
    }

    #[test]
    fn mark_all_as_read_moves_read_mark_of_active_timeline() {
        let mut list = list_of(&["home", "mentions"]);
        let home = list.get(0).unwrap().id();
        list.merge_into(home, vec![status(1, 0), status(2, 5)]);
        assert_eq!(list.last_read_id(0), None);

        list.mark_all_as_read();
        assert_eq!(list.last_read_id(0), Some(MessageId(2)));

        list.merge_into(home, vec![status(3, 10)]);
        assert_eq!(list.last_read_id(0), Some(MessageId(2)));
        list.mark_all_as_read();
        assert_eq!(list.last_read_id(0), Some(MessageId(3)));
        assert_eq!(list.last_read_id(1), None);

        list.delete_active_timeline();
        assert_eq!(list.last_read_id(0), None);
    }

    #[test]
    fn public_operations_keep_window_consistent() {
        let mut list = list_of(&["a", "b", "c", "d", "e"]);
        for round in 0..8 {
            for step in 0..16 {
                match (round + step) % 16 {
                    0 => {
                        list.activate_index(99);
                    }
                    1 => list.activate_last(),
                    2 => list.expand_visible_previous(),
                    3 => list.set_visible_range(7, 1),
                    4 => list.shift_active_beginning(),
                    5 => list.shrink_visible_end(),
                    6 => list.activate_next(),
                    7 => list.expand_visible_next(),
                    8 => {
                        list.delete_active_timeline();
                    }
                    9 => list.shift_active_end(),
                    10 => list.set_visible_range(100, 200),
                    11 => list.shrink_visible_beginning(),
                    12 => list.activate_previous(),
                    13 => list.shift_active_next(),
                    14 => list.shift_active_previous(),
                    _ => {
                        list.activate_index(1);
                    }
                }
                assert_invariants(&list);
                let relative = list.get_visible_timeline_relative_index();
                assert!(relative.map_or(true, |at| at < list.get_visible_timelines().len()));
            }
            list.append_timeline(Timeline::new(format!("extra {}", round)));
        }

        while list.delete_active_timeline().is_some() {
            assert_invariants(&list);
        }
        assert_invariants(&list);
    }

    #[test]
    fn merge_for_deleted_timeline_is_dropped() {
        let mut list = list_of(&["home", "mentions"]);
        let home = list.get(0).unwrap().id();
        list.delete_active_timeline();
        assert!(list.merge_into(home, vec![status(1, 0)]).is_none());
        assert_eq!(list.get_unread_counts(), vec![0]);
    }
}
