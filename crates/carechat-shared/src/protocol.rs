//! Push-transport wire protocol.
//!
//! Every frame is a JSON text frame of the shape
//! `{"event": "<name>", "data": { ... }}` with camelCase payload fields.
//! Inbound frames are validated into a closed [`InboundEvent`] union at the
//! boundary; anything that does not fit is a [`ProtocolError`].

use serde::{Deserialize, Serialize};

use crate::constants::{EVENT_NEW_CONVERSATION, EVENT_RECEIVE_MESSAGE, EVENT_TYPING};
use crate::error::ProtocolError;
use crate::types::{Conversation, ConversationId, Message, TypingSignal};

/// Events pushed by the server. Decoded by name through [`InboundEvent::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    ReceiveMessage(Message),
    Typing(TypingSignal),
    NewConversation(Conversation),
}

/// Events this client pushes to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    JoinConversation(JoinConversation),
    SendMessage(Message),
    Typing(TypingSignal),
}

/// Request to receive a conversation's room traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConversation {
    pub conversation_id: ConversationId,
    pub identity: String,
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl InboundEvent {
    /// Parse and validate one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let frame: RawFrame = serde_json::from_str(text)?;
        let event = match frame.event.as_str() {
            EVENT_RECEIVE_MESSAGE => Self::ReceiveMessage(serde_json::from_value(frame.data)?),
            EVENT_TYPING => Self::Typing(serde_json::from_value(frame.data)?),
            EVENT_NEW_CONVERSATION => Self::NewConversation(serde_json::from_value(frame.data)?),
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

impl OutboundEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinConversation(_) => crate::constants::EVENT_JOIN_CONVERSATION,
            Self::SendMessage(_) => crate::constants::EVENT_SEND_MESSAGE,
            Self::Typing(_) => EVENT_TYPING,
        }
    }
}
