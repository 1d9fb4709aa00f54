//! Ordered collection of conversation summaries, most recent first.

use chrono::{DateTime, Utc};
use tracing::debug;

use carechat_shared::types::{Conversation, ConversationId};

/// Result of [`ConversationRegistry::upsert_from_push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The conversation was new and is now at the front.
    Inserted,
    /// The id was already present; nothing changed.
    AlreadyKnown,
}

/// Conversations ordered by descending `last_activity_at`.
///
/// The order is established when seeding and maintained by every mutation;
/// [`list`](Self::list) only filters, it never re-sorts.
#[derive(Debug, Clone, Default)]
pub struct ConversationRegistry {
    conversations: Vec<Conversation>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the history API, replacing everything.
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn replace_all(&mut self, mut conversations: Vec<Conversation>) {
        conversations.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));

        let mut seen = std::collections::HashSet::new();
        conversations.retain(|c| seen.insert(c.id.clone()));

        debug!(count = conversations.len(), "Conversation registry seeded");
        self.conversations = conversations;
    }

    /// Conversations whose display name contains `term`, case-insensitively.
    /// An empty term matches everything.
    pub fn list(&self, term: &str) -> Vec<&Conversation> {
        let needle = term.trim().to_lowercase();
        self.conversations
            .iter()
            .filter(|c| needle.is_empty() || c.display_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Insert a conversation announced by the push transport.
    ///
    /// Unknown ids are prepended. Known ids are left untouched, including
    /// their activity time: repeat announcements are not reconciled.
    pub fn upsert_from_push(&mut self, conversation: Conversation) -> Upsert {
        if self.contains(&conversation.id) {
            debug!(conversation = %conversation.id, "Ignoring announcement for known conversation");
            return Upsert::AlreadyKnown;
        }

        self.conversations.insert(0, conversation);
        Upsert::Inserted
    }

    /// Record activity at `at`, moving the conversation to the front.
    ///
    /// The stored time never decreases. Returns `false` for unknown ids.
    pub fn touch(&mut self, id: &ConversationId, at: DateTime<Utc>) -> bool {
        let Some(idx) = self.conversations.iter().position(|c| &c.id == id) else {
            return false;
        };

        let mut conversation = self.conversations.remove(idx);
        if at > conversation.last_activity_at {
            conversation.last_activity_at = at;
        }

        // Keep the descending order: only jump ahead of entries that are
        // not more recent than this one.
        let target = self
            .conversations
            .iter()
            .position(|c| c.last_activity_at <= conversation.last_activity_at)
            .unwrap_or(self.conversations.len());
        self.conversations.insert(target, conversation);
        true
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
