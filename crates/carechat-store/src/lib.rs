//! # carechat-store
//!
//! In-memory state for the support-chat session: the conversation
//! registry, the active conversation's message log, the unread set and an
//! optional bounded cache of recently viewed logs.
//!
//! Nothing here is persisted; everything lives for the lifetime of one
//! session and is mutated only from the session controller's event loop.

pub mod history_cache;
pub mod message_log;
pub mod registry;
pub mod unread;

pub use history_cache::{CachePolicy, HistoryCache};
pub use message_log::MessageLog;
pub use registry::{ConversationRegistry, Upsert};
pub use unread::UnreadTracker;
