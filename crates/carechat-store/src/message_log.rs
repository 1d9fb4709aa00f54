//! The open conversation's messages, in arrival order.

use std::collections::HashSet;

use tracing::debug;

use carechat_shared::types::{ConversationId, Message, MessageId};

/// Append-only, id-deduplicated message sequence for one conversation.
///
/// Messages keep the order they arrived in; the log never sorts by
/// timestamp. Inserting an id that is already present is a no-op.
#[derive(Debug, Clone)]
pub struct MessageLog {
    conversation_id: ConversationId,
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl MessageLog {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            messages: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Build a log from fetched history, dropping repeated ids.
    pub fn from_history(conversation_id: ConversationId, history: Vec<Message>) -> Self {
        let mut log = Self::new(conversation_id);
        for message in history {
            log.append(message);
        }
        log
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Append unless the id is already present. Returns whether the log changed.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id.clone()) {
            debug!(msg_id = %message.id, "Duplicate message ignored");
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Swap the message at `old_id` for `message`, keeping its position.
    ///
    /// Falls back to [`append`](Self::append) when `old_id` is absent. If
    /// `message`'s id is already elsewhere in the log the old entry is only
    /// removed, so no id ever appears twice.
    pub fn replace(&mut self, old_id: &MessageId, message: Message) -> bool {
        let Some(idx) = self.position(old_id) else {
            return self.append(message);
        };

        if &message.id != old_id && self.ids.contains(&message.id) {
            self.remove(old_id);
            return true;
        }

        self.ids.remove(old_id);
        self.ids.insert(message.id.clone());
        self.messages[idx] = message;
        true
    }

    /// Remove and return the message with `id`, if present.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let idx = self.position(id)?;
        self.ids.remove(id);
        Some(self.messages.remove(idx))
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        if !self.ids.contains(id) {
            return None;
        }
        self.messages.iter().position(|m| &m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carechat_shared::types::Sender;
    use chrono::{TimeZone, Utc};

    fn msg(id: &str, content: &str) -> Message {
        Message {
            id: MessageId::from(id),
            conversation_id: ConversationId::from("c1"),
            sender: Sender::Counterparty,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
        }
    }

    fn ids(log: &MessageLog) -> Vec<&str> {
        log.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn duplicate_append_leaves_log_unchanged() {
        let mut log = MessageLog::new("c1".into());
        assert!(log.append(msg("a", "one")));
        assert!(log.append(msg("b", "two")));
        assert!(!log.append(msg("a", "one again")));

        assert_eq!(ids(&log), ["a", "b"]);
        assert_eq!(log.messages()[0].content, "one");
    }

    #[test]
    fn keeps_arrival_order_over_timestamps() {
        let mut log = MessageLog::new("c1".into());
        let mut late = msg("late", "x");
        late.timestamp = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        log.append(late);
        log.append(msg("early", "y"));
        assert_eq!(ids(&log), ["late", "early"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut log = MessageLog::new("c1".into());
        log.append(msg("a", "one"));
        log.append(msg("pending-1", "Sending file: y.png"));
        log.append(msg("c", "three"));

        assert!(log.replace(&"pending-1".into(), msg("final", "https://x/y.png")));
        assert_eq!(ids(&log), ["a", "final", "c"]);
        assert!(!log.contains(&"pending-1".into()));
        assert!(log.contains(&"final".into()));
    }

    #[test]
    fn replace_of_absent_id_appends() {
        let mut log = MessageLog::new("c1".into());
        log.append(msg("a", "one"));
        assert!(log.replace(&"missing".into(), msg("b", "two")));
        assert_eq!(ids(&log), ["a", "b"]);
    }

    #[test]
    fn replace_never_duplicates_an_id() {
        let mut log = MessageLog::new("c1".into());
        log.append(msg("a", "one"));
        log.append(msg("p", "placeholder"));
        assert!(log.replace(&"p".into(), msg("a", "one")));
        assert_eq!(ids(&log), ["a"]);
    }

    #[test]
    fn remove_retracts_message() {
        let mut log = MessageLog::new("c1".into());
        log.append(msg("a", "one"));
        log.append(msg("p", "placeholder"));

        let removed = log.remove(&"p".into()).unwrap();
        assert_eq!(removed.content, "placeholder");
        assert_eq!(ids(&log), ["a"]);
        assert!(log.remove(&"p".into()).is_none());
        assert!(log.append(msg("p", "again")));
    }

    #[test]
    fn history_is_deduplicated() {
        let log = MessageLog::from_history(
            "c1".into(),
            vec![msg("a", "1"), msg("b", "2"), msg("a", "1")],
        );
        assert_eq!(ids(&log), ["a", "b"]);
    }
}
