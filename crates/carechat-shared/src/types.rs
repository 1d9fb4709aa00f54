use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PROVISIONAL_ID_PREFIX;

/// Opaque, server-assigned conversation identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Message identifier, unique within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// A fresh locally generated id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// A locally generated id for a placeholder that will be swapped out
    /// once its upload resolves.
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The two actors of a support conversation.
///
/// Any sender value other than `operator` deserializes as
/// [`Sender::Counterparty`], and so does a missing one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local user of this client.
    Operator,
    /// The remote party.
    #[default]
    #[serde(other)]
    Counterparty,
}

/// Summary of one conversation as listed in the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub display_name: String,
    pub last_activity_at: DateTime<Utc>,
}

/// A single chat message.
///
/// `content` is either literal text or an absolute URL standing for an
/// attachment; see [`crate::format::classify_content`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A message authored locally by the operator, with a fresh id.
    pub fn outgoing(
        conversation_id: ConversationId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            conversation_id,
            sender: Sender::Operator,
            content: content.into(),
            timestamp,
        }
    }

    /// The optimistic stand-in shown while `file_name` uploads.
    pub fn placeholder(
        conversation_id: ConversationId,
        file_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::provisional(),
            conversation_id,
            sender: Sender::Operator,
            content: format!("Sending file: {file_name}"),
            timestamp,
        }
    }
}

/// Payload of a typing signal, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    #[serde(default)]
    pub sender: Sender,
    pub conversation_id: ConversationId,
}
