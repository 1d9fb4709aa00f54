use tokio::sync::mpsc;

use carechat_shared::types::{ConversationId, MessageId};

/// Visible state changes, pushed to whatever renders the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ConversationsChanged,
    UnreadChanged {
        conversation_id: ConversationId,
        unread: bool,
    },
    MessagesChanged { conversation_id: ConversationId },
    TypingChanged {
        conversation_id: ConversationId,
        is_typing: bool,
    },
    LoadFailed {
        conversation_id: Option<ConversationId>,
        reason: String,
    },
    AttachmentSelected { file_name: String, size: usize },
    AttachmentRejected {
        file_name: String,
        size: usize,
        max: usize,
    },
    UploadFailed {
        conversation_id: ConversationId,
        file_name: String,
        reason: String,
    },
    SendFailed {
        conversation_id: ConversationId,
        message_id: MessageId,
        reason: String,
    },
    ConnectionChanged { connected: bool },
}

/// Sending half of the session's event stream.
///
/// A dropped receiver is logged, never an error for the session.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::error!(event = ?e.0, "Failed to emit session event");
        }
    }
}
