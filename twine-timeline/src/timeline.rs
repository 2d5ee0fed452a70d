use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use twine_protocol::message::{Message, MessageId};
use uuid::Uuid;

use crate::active_list::sealed::{CursorOwner, Token};
use crate::active_list::{ActiveList, Cursor};
use crate::error::TimelineError;
use crate::fetch::{FetchParams, FetchRequest, UpdateDescriptor};

/// Identity of a timeline, stable for its whole lifetime.
///
/// Positions change when timelines are shifted or deleted; asynchronous
/// results are matched back to their timeline through this id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(Uuid);

impl TimelineId {
    pub fn new() -> Self {
        TimelineId(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Result of merging a batch of messages into a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Messages that were not in the timeline before.
    pub inserted: usize,
    /// Inserted messages created no earlier than the previous newest
    /// message. Every inserted message counts when the timeline was empty.
    pub newer: usize,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }
}

/// Deduplicated collection of messages for one feed, newest first.
///
/// The order is re-established after every insertion: messages are sorted by
/// creation time, descending, and messages sharing a timestamp keep the order
/// in which they were inserted. The message cursor follows the active message
/// when newer messages are inserted above it.
#[derive(Debug)]
pub struct Timeline {
    id: TimelineId,
    name: String,
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
    cursor: Cursor,
    update: Option<UpdateDescriptor>,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            messages: Vec::new(),
            ids: HashSet::new(),
            cursor: Cursor::new(),
            update: None,
        }
    }

    pub fn with_update(name: impl Into<String>, update: UpdateDescriptor) -> Self {
        let mut timeline = Self::new(name);
        timeline.update = Some(update);
        timeline
    }

    pub fn with_messages<I>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = Message>,
    {
        self.add_messages(messages);
        self
    }

    pub fn id(&self) -> TimelineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_descriptor(&self) -> Option<&UpdateDescriptor> {
        self.update.as_ref()
    }

    pub fn has_update_source(&self) -> bool {
        self.update.is_some()
    }

    /// Inserts `message` unless a message with the same id is already present.
    pub fn add_message(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id()) {
            return false;
        }

        let created_at = message.created_at();
        let position = self
            .messages
            .partition_point(|existing| existing.created_at() >= created_at);
        self.messages.insert(position, message);
        self.cursor.inserted(position);
        true
    }

    /// Inserts every message not already present, in input order, with a
    /// single sort pass at the end.
    pub fn add_messages<I>(&mut self, messages: I) -> MergeReport
    where
        I: IntoIterator<Item = Message>,
    {
        let newest_before = self.newest().map(Message::created_at);
        let active_id = self.get_active().map(Message::id);
        let mut report = MergeReport::default();

        for message in messages {
            if !self.ids.insert(message.id()) {
                continue;
            }
            report.inserted += 1;
            // Ids are unique here, so a message at the newest timestamp is a new one.
            if newest_before.map_or(true, |newest| message.created_at() >= newest) {
                report.newer += 1;
            }
            self.messages.push(message);
        }

        if report.is_empty() {
            return report;
        }

        self.messages.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        let active = match active_id {
            Some(id) => self.position(id),
            None => Some(0),
        };
        self.cursor.set(active);
        report
    }

    /// Removes the message with `id`, keeping the cursor on the same message
    /// when it was not the one removed.
    pub fn remove_message(&mut self, id: MessageId) -> Option<Message> {
        let position = self.position(id)?;
        self.ids.remove(&id);
        let removed = self.messages.remove(position);
        self.cursor.removed(position, self.messages.len());
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
        self.cursor = Cursor::new();
    }

    /// Messages created strictly after `timestamp`, newest first.
    pub fn get_newer_than(&self, timestamp: DateTime<Utc>) -> &[Message] {
        let end = self
            .messages
            .partition_point(|message| message.created_at() > timestamp);
        &self.messages[..end]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn get_active(&self) -> Option<&Message> {
        self.cursor.index().and_then(|index| self.messages.get(index))
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.ids.contains(&id)
    }

    pub fn position(&self, id: MessageId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.messages.iter().position(|message| message.id() == id)
    }

    pub fn newest(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn oldest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn newest_id(&self) -> Option<MessageId> {
        self.newest().map(Message::id)
    }

    pub fn oldest_id(&self) -> Option<MessageId> {
        self.oldest().map(Message::id)
    }

    /// Detached fetch for this timeline; `overrides` apply to this request only.
    pub fn fetch_request(&self, overrides: &FetchParams) -> Result<FetchRequest, TimelineError> {
        self.update
            .as_ref()
            .map(|update| update.request(overrides))
            .ok_or_else(TimelineError::missing_update_source)
    }

    /// Merges messages fetched for this timeline.
    pub fn merge_fetched(&mut self, messages: Vec<Message>) -> MergeReport {
        let fetched = messages.len();
        let report = self.add_messages(messages);
        debug!(
            timeline = %self.name,
            fetched,
            inserted = report.inserted,
            newer = report.newer,
            "merged fetched messages"
        );
        report
    }

    /// Fetches from the bound source and merges the result.
    pub async fn update(&mut self) -> Result<MergeReport, TimelineError> {
        self.update_with(FetchParams::default()).await
    }

    /// Like [`Timeline::update`], with `extra` parameters for this call only.
    pub async fn update_with(&mut self, extra: FetchParams) -> Result<MergeReport, TimelineError> {
        let request = self.fetch_request(&extra)?;
        let messages = request.execute().await?;
        Ok(self.merge_fetched(messages))
    }

    /// Fetches only messages newer than the newest one held.
    pub async fn update_newer(&mut self) -> Result<MergeReport, TimelineError> {
        let extra = self.newest_id().map(FetchParams::since).unwrap_or_default();
        self.update_with(extra).await
    }

    /// Fetches messages older than the oldest one held.
    pub async fn update_older(&mut self) -> Result<MergeReport, TimelineError> {
        let extra = self.oldest_id().map(FetchParams::until).unwrap_or_default();
        self.update_with(extra).await
    }
}

impl CursorOwner for Timeline {
    fn cursor_mut(&mut self, _: Token) -> &mut Cursor {
        &mut self.cursor
    }
}

impl ActiveList for Timeline {
    fn len(&self) -> usize {
        self.messages.len()
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
