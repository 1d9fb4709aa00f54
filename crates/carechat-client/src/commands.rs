//! Commands sent *into* a running session, and the handle that sends them.

use tokio::sync::{mpsc, oneshot};

use carechat_net::AttachmentFile;
use carechat_shared::types::{Conversation, ConversationId, Message};

use crate::error::SessionError;

#[derive(Debug)]
pub enum SessionCommand {
    /// Make a conversation the active one.
    Open(ConversationId),
    /// Stage a file for the next send.
    SelectAttachment(AttachmentFile),
    DiscardAttachment,
    /// One send gesture: the text (if any) and the staged file (if any)
    /// go out as independent sub-operations.
    Send { text: Option<String> },
    /// The operator typed in the composer.
    Typing,
    /// Snapshot of the registry filtered by a search term.
    ListConversations {
        term: String,
        reply: oneshot::Sender<Vec<Conversation>>,
    },
    /// Snapshot of the active conversation's messages.
    ListMessages { reply: oneshot::Sender<Vec<Message>> },
    Shutdown,
}

/// Cloneable front door to a session running in its own task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    pub async fn open(&self, id: ConversationId) -> Result<(), SessionError> {
        self.send(SessionCommand::Open(id)).await
    }

    pub async fn select_attachment(&self, file: AttachmentFile) -> Result<(), SessionError> {
        self.send(SessionCommand::SelectAttachment(file)).await
    }

    pub async fn discard_attachment(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::DiscardAttachment).await
    }

    pub async fn send_message(&self, text: Option<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::Send { text }).await
    }

    pub async fn typing(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Typing).await
    }

    pub async fn conversations(&self, term: &str) -> Result<Vec<Conversation>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::ListConversations {
            term: term.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn messages(&self) -> Result<Vec<Message>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::ListMessages { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(cmd).await.map_err(|_| SessionError::Closed)
    }
}
