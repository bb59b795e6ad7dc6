//! The visible message list of one thread.
//!
//! Entries keep insertion order and are indexed twice: by the imitation id of
//! an optimistic placeholder and by the authoritative id of a confirmed
//! message. A placeholder is never indexed by message id, so a confirmed
//! message and its placeholder can never be mistaken for one another.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, PoisonError},
};

use shared::{
    domain::{ImitationId, MessageId},
    protocol::SerializedMessage,
};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub message: SerializedMessage,
    /// Set while the entry is an optimistic placeholder.
    pub imitation_id: Option<ImitationId>,
    pub state: DeliveryState,
}

impl TimelineEntry {
    pub fn is_placeholder(&self) -> bool {
        self.imitation_id.is_some()
    }
}

/// What happened to the list when a confirmation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Placeholder dropped and the confirmed message appended.
    Appended,
    /// Placeholder swapped for the confirmed message at the same position.
    Replaced,
    /// The confirmed message was already listed. Only the placeholder went away.
    AlreadyPresent,
    /// A push had already resolved the placeholder. Nothing changed.
    Superseded,
}

#[derive(Debug, Default)]
pub struct MessageTimeline {
    entries: BTreeMap<u64, TimelineEntry>,
    next_seq: u64,
    by_imitation: HashMap<ImitationId, u64>,
    by_message: HashMap<MessageId, u64>,
}

impl MessageTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the list with already confirmed messages, skipping duplicates.
    pub fn from_messages(messages: impl IntoIterator<Item = SerializedMessage>) -> Self {
        let mut timeline = Self::new();
        for message in messages {
            timeline.push_confirmed(message);
        }
        timeline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.values()
    }

    pub fn messages(&self) -> Vec<SerializedMessage> {
        self.entries().map(|entry| entry.message.clone()).collect()
    }

    pub fn contains_message(&self, id: MessageId) -> bool {
        self.by_message.contains_key(&id)
    }

    pub fn placeholder(&self, imitation_id: ImitationId) -> Option<&TimelineEntry> {
        self.by_imitation
            .get(&imitation_id)
            .and_then(|seq| self.entries.get(seq))
    }

    /// Returns false when a placeholder with this imitation id already exists.
    pub fn push_placeholder(&mut self, imitation_id: ImitationId, message: SerializedMessage) -> bool {
        if self.by_imitation.contains_key(&imitation_id) {
            return false;
        }
        let seq = self.next_seq();
        self.by_imitation.insert(imitation_id, seq);
        self.entries.insert(
            seq,
            TimelineEntry {
                message,
                imitation_id: Some(imitation_id),
                state: DeliveryState::Pending,
            },
        );
        true
    }

    /// Appends a confirmed message unless its id is already listed.
    pub fn push_confirmed(&mut self, message: SerializedMessage) -> bool {
        if self.by_message.contains_key(&message.id) {
            return false;
        }
        let seq = self.next_seq();
        self.by_message.insert(message.id, seq);
        self.entries.insert(
            seq,
            TimelineEntry {
                message,
                imitation_id: None,
                state: DeliveryState::Confirmed,
            },
        );
        true
    }

    pub fn remove_placeholder(&mut self, imitation_id: ImitationId) -> Option<TimelineEntry> {
        let seq = self.by_imitation.remove(&imitation_id)?;
        self.entries.remove(&seq)
    }

    /// Applies a send response: the placeholder goes away and the confirmed
    /// message ends up listed exactly once, at the end of the list. A response
    /// for a placeholder that is already gone is dropped, since the push that
    /// removed it listed the message in its place.
    pub fn confirm(&mut self, imitation_id: ImitationId, message: SerializedMessage) -> Reconciled {
        if self.remove_placeholder(imitation_id).is_none() {
            return Reconciled::Superseded;
        }
        if self.push_confirmed(message) {
            Reconciled::Appended
        } else {
            Reconciled::AlreadyPresent
        }
    }

    /// Applies a message delivered by the push channel. A matching
    /// placeholder is swapped in place. Returns `None` when nothing changed.
    pub fn merge_pushed(
        &mut self,
        message: SerializedMessage,
        imitation_id: Option<ImitationId>,
    ) -> Option<Reconciled> {
        if self.by_message.contains_key(&message.id) {
            return None;
        }
        let Some(seq) = imitation_id.and_then(|id| self.by_imitation.remove(&id)) else {
            self.push_confirmed(message);
            return Some(Reconciled::Appended);
        };
        self.by_message.insert(message.id, seq);
        self.entries.insert(
            seq,
            TimelineEntry {
                message,
                imitation_id: None,
                state: DeliveryState::Confirmed,
            },
        );
        Some(Reconciled::Replaced)
    }

    pub fn set_placeholder_state(&mut self, imitation_id: ImitationId, state: DeliveryState) -> bool {
        let Some(entry) = self
            .by_imitation
            .get(&imitation_id)
            .and_then(|seq| self.entries.get_mut(seq))
        else {
            return false;
        };
        entry.state = state;
        true
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// The single mutation point of a visible list. `update` hands the transform
/// the latest state, never a stale copy.
pub trait MessageListUpdater: Send + Sync {
    fn update(&self, transform: &mut dyn FnMut(&mut MessageTimeline));

    fn snapshot(&self) -> Vec<TimelineEntry>;
}

/// Runs `transform` through `updater` and returns its output, or `None` if
/// the updater never ran it.
pub fn update_with<R>(
    updater: &dyn MessageListUpdater,
    transform: impl FnOnce(&mut MessageTimeline) -> R,
) -> Option<R> {
    let mut transform = Some(transform);
    let mut output = None;
    updater.update(&mut |timeline| {
        if let Some(transform) = transform.take() {
            output = Some(transform(timeline));
        }
    });
    output
}

/// Timeline behind a mutex, publishing a snapshot after every update.
pub struct SharedTimeline {
    timeline: Mutex<MessageTimeline>,
    snapshots: watch::Sender<Vec<TimelineEntry>>,
}

impl SharedTimeline {
    pub fn new(timeline: MessageTimeline) -> Self {
        let (snapshots, _) = watch::channel(timeline.entries().cloned().collect());
        Self {
            timeline: Mutex::new(timeline),
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TimelineEntry>> {
        self.snapshots.subscribe()
    }
}

impl Default for SharedTimeline {
    fn default() -> Self {
        Self::new(MessageTimeline::new())
    }
}

impl MessageListUpdater for SharedTimeline {
    fn update(&self, transform: &mut dyn FnMut(&mut MessageTimeline)) {
        let mut timeline = self.timeline.lock().unwrap_or_else(PoisonError::into_inner);
        transform(&mut timeline);
        self.snapshots
            .send_replace(timeline.entries().cloned().collect());
    }

    fn snapshot(&self) -> Vec<TimelineEntry> {
        self.timeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use shared::domain::{MessageFormat, ThreadId, UserId};

    use super::*;

    fn message(id: MessageId, body: &str) -> SerializedMessage {
        SerializedMessage {
            id,
            body: body.into(),
            sent_at: Utc::now(),
            users_id: UserId::new(),
            thread_id: ThreadId::new(),
            mentions: Vec::new(),
            attachments: Vec::new(),
            reactions: Vec::new(),
            message_format: MessageFormat::Linen,
            author: None,
        }
    }

    fn bodies(timeline: &MessageTimeline) -> Vec<String> {
        timeline.entries().map(|e| e.message.body.clone()).collect()
    }

    #[test]
    fn confirm_appends_after_later_messages() {
        let imitation = ImitationId::new();
        let mut timeline = MessageTimeline::from_messages([message(MessageId::new(), "a")]);
        timeline.push_placeholder(imitation, message(MessageId(imitation.0), "mine"));
        timeline.push_confirmed(message(MessageId::new(), "b"));

        let outcome = timeline.confirm(imitation, message(MessageId::new(), "mine"));
        assert_eq!(outcome, Reconciled::Appended);
        assert_eq!(bodies(&timeline), vec!["a", "b", "mine"]);
        assert!(timeline.placeholder(imitation).is_none());
    }

    #[test]
    fn confirm_after_push_only_drops_placeholder() {
        let imitation = ImitationId::new();
        let confirmed = message(MessageId::new(), "mine");
        let mut timeline = MessageTimeline::new();
        timeline.push_placeholder(imitation, message(MessageId(imitation.0), "mine"));
        assert_eq!(
            timeline.merge_pushed(confirmed.clone(), None),
            Some(Reconciled::Appended)
        );
        assert_eq!(timeline.len(), 2);

        assert_eq!(
            timeline.confirm(imitation, confirmed),
            Reconciled::AlreadyPresent
        );
        assert_eq!(timeline.len(), 1);
        assert!(!timeline.entries().any(TimelineEntry::is_placeholder));
    }

    #[test]
    fn pushed_message_replaces_placeholder_in_place() {
        let imitation = ImitationId::new();
        let mut timeline = MessageTimeline::new();
        timeline.push_placeholder(imitation, message(MessageId(imitation.0), "mine"));
        timeline.push_confirmed(message(MessageId::new(), "later"));

        let pushed = message(MessageId::new(), "mine");
        assert_eq!(
            timeline.merge_pushed(pushed.clone(), Some(imitation)),
            Some(Reconciled::Replaced)
        );
        assert_eq!(bodies(&timeline), vec!["mine", "later"]);
        assert_eq!(timeline.merge_pushed(pushed, Some(imitation)), None);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn confirm_after_replacing_push_is_dropped() {
        let imitation = ImitationId::new();
        let mut timeline = MessageTimeline::new();
        timeline.push_placeholder(imitation, message(MessageId(imitation.0), "mine"));
        timeline.merge_pushed(message(MessageId::new(), "mine"), Some(imitation));

        let outcome = timeline.confirm(imitation, message(MessageId::new(), "mine"));
        assert_eq!(outcome, Reconciled::Superseded);
        assert_eq!(bodies(&timeline), vec!["mine"]);
    }

    #[test]
    fn duplicate_confirmed_messages_are_ignored() {
        let id = MessageId::new();
        let timeline = MessageTimeline::from_messages([message(id, "x"), message(id, "x")]);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn failed_state_is_tracked_per_placeholder() {
        let first = ImitationId::new();
        let second = ImitationId::new();
        let mut timeline = MessageTimeline::new();
        timeline.push_placeholder(first, message(MessageId(first.0), "1"));
        timeline.push_placeholder(second, message(MessageId(second.0), "2"));

        assert!(timeline.set_placeholder_state(first, DeliveryState::Failed("boom".into())));
        assert_eq!(
            timeline.placeholder(first).map(|e| e.state.clone()),
            Some(DeliveryState::Failed("boom".into()))
        );
        assert_eq!(
            timeline.placeholder(second).map(|e| e.state.clone()),
            Some(DeliveryState::Pending)
        );
        assert!(!timeline.set_placeholder_state(ImitationId::new(), DeliveryState::Pending));
    }

    #[test]
    fn shared_timeline_publishes_snapshots() {
        let shared = SharedTimeline::default();
        let rx = shared.subscribe();
        let added = update_with(&shared, |timeline| {
            timeline.push_confirmed(message(MessageId::new(), "hi"))
        });
        assert_eq!(added, Some(true));
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(shared.snapshot().len(), 1);
    }
}
