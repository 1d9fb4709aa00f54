//! Session state owned by the controller's event loop.

use std::time::Duration;

use carechat_shared::types::ConversationId;
use carechat_store::{CachePolicy, ConversationRegistry, HistoryCache, MessageLog, UnreadTracker};

use crate::typing::TypingIndicator;

/// Resources scoped to the one open conversation. Switching drops the
/// whole struct, which tears down its log and typing timer together.
#[derive(Debug)]
pub struct ActiveConversation {
    pub id: ConversationId,
    pub log: MessageLog,
    pub typing: TypingIndicator,
}

impl ActiveConversation {
    pub fn new(id: ConversationId, typing_decay: Duration) -> Self {
        Self {
            log: MessageLog::new(id.clone()),
            typing: TypingIndicator::new(typing_decay),
            id,
        }
    }
}

#[derive(Debug)]
pub struct SessionState {
    pub registry: ConversationRegistry,
    pub unread: UnreadTracker,
    pub active: Option<ActiveConversation>,
    pub cache: HistoryCache,
}

impl SessionState {
    pub fn new(cache_policy: CachePolicy) -> Self {
        Self {
            registry: ConversationRegistry::new(),
            unread: UnreadTracker::new(),
            active: None,
            cache: HistoryCache::new(cache_policy),
        }
    }

    pub fn active_id(&self) -> Option<&ConversationId> {
        self.active.as_ref().map(|a| &a.id)
    }

    pub fn is_active(&self, id: &ConversationId) -> bool {
        self.active_id() == Some(id)
    }

    /// The active conversation, if it is `id`.
    pub fn active_if(&mut self, id: &ConversationId) -> Option<&mut ActiveConversation> {
        self.active.as_mut().filter(|a| &a.id == id)
    }
}
