use std::collections::HashSet;

use carechat_shared::types::ConversationId;

/// Conversations with activity the operator has not looked at yet.
///
/// Membership is binary; there is no unread count.
#[derive(Debug, Clone, Default)]
pub struct UnreadTracker {
    unread: HashSet<ConversationId>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a conversation. Returns `true` if it was not already flagged.
    pub fn mark(&mut self, id: ConversationId) -> bool {
        self.unread.insert(id)
    }

    /// Clear a conversation's flag. Returns `true` if it was flagged.
    pub fn clear(&mut self, id: &ConversationId) -> bool {
        self.unread.remove(id)
    }

    pub fn is_unread(&self, id: &ConversationId) -> bool {
        self.unread.contains(id)
    }

    pub fn len(&self) -> usize {
        self.unread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unread.is_empty()
    }
}
