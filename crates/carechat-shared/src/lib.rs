//! # carechat-shared
//!
//! Data model, push-transport wire protocol and pure formatting helpers
//! shared by every layer of the support-chat synchronisation core.

pub mod clock;
pub mod constants;
pub mod error;
pub mod format;
pub mod protocol;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ProtocolError;
pub use protocol::{InboundEvent, JoinConversation, OutboundEvent};
pub use types::{Conversation, ConversationId, Message, MessageId, Sender, TypingSignal};
