//! Bounded LRU of message logs for recently viewed conversations.
//!
//! Disabled by default (capacity 0), in which case every conversation
//! switch refetches history. When enabled:
//! - a log is stored when the operator switches away from it;
//! - a stored log younger than the TTL is handed back on reopen, and
//!   leaves the cache while it is the active log;
//! - an older one is evicted and the caller refetches;
//! - exceeding capacity evicts the least recently stored entry;
//! - callers invalidate an entry when its conversation receives a message
//!   while not active, since the stored log no longer matches the server.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use carechat_shared::types::ConversationId;

use crate::message_log::MessageLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum number of stored logs; 0 disables the cache.
    pub capacity: usize,
    /// Age after which a stored log is considered stale.
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            capacity: 0,
            ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Entry {
    log: MessageLog,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct HistoryCache {
    policy: CachePolicy,
    // Front is the most recently stored entry.
    entries: VecDeque<Entry>,
}

impl HistoryCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: VecDeque::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.capacity > 0
    }

    pub fn store(&mut self, log: MessageLog, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        self.invalidate(log.conversation_id());
        self.entries.push_front(Entry { log, stored_at: now });

        while self.entries.len() > self.policy.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                debug!(conversation = %evicted.log.conversation_id(), "History cache evicted entry");
            }
        }
    }

    /// Take the stored log for `id` if it is still fresh.
    pub fn take_fresh(&mut self, id: &ConversationId, now: Instant) -> Option<MessageLog> {
        let idx = self.index_of(id)?;
        let entry = self.entries.remove(idx)?;

        if now.saturating_duration_since(entry.stored_at) >= self.policy.ttl {
            debug!(conversation = %id, "History cache entry stale");
            return None;
        }
        Some(entry.log)
    }

    pub fn invalidate(&mut self, id: &ConversationId) -> bool {
        match self.index_of(id) {
            Some(idx) => self.entries.remove(idx).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index_of(&self, id: &ConversationId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.log.conversation_id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize, ttl_secs: u64) -> HistoryCache {
        HistoryCache::new(CachePolicy {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
        })
    }

    fn log(id: &str) -> MessageLog {
        MessageLog::new(id.into())
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let mut cache = cache(0, 60);
        cache.store(log("a"), Instant::now());
        assert!(cache.is_empty());
        assert!(!cache.is_enabled());
    }

    #[test]
    fn fresh_entry_is_returned_once() {
        let mut cache = cache(2, 60);
        let t0 = Instant::now();
        cache.store(log("a"), t0);

        let hit = cache.take_fresh(&"a".into(), t0 + Duration::from_secs(59));
        assert_eq!(hit.unwrap().conversation_id(), &ConversationId::from("a"));
        assert!(cache.take_fresh(&"a".into(), t0).is_none());
    }

    #[test]
    fn stale_entry_is_evicted() {
        let mut cache = cache(2, 60);
        let t0 = Instant::now();
        cache.store(log("a"), t0);

        assert!(cache.take_fresh(&"a".into(), t0 + Duration::from_secs(60)).is_none());
        assert!(!cache.contains(&"a".into()));
    }

    #[test]
    fn evicts_least_recently_stored() {
        let mut cache = cache(2, 60);
        let t0 = Instant::now();
        cache.store(log("a"), t0);
        cache.store(log("b"), t0);
        cache.store(log("a"), t0);
        cache.store(log("c"), t0);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&"a".into()));
        assert!(cache.contains(&"c".into()));
        assert!(!cache.contains(&"b".into()));
    }

    #[test]
    fn invalidate_drops_entry() {
        let mut cache = cache(2, 60);
        cache.store(log("a"), Instant::now());
        assert!(cache.invalidate(&"a".into()));
        assert!(!cache.invalidate(&"a".into()));
    }
}
