//! Test doubles for the session's collaborators.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;

use carechat_net::{
    ApiError, AttachmentFile, AttachmentUploader, HistoryApi, PushTransport, TransportError,
    UploadResponse,
};
use carechat_shared::protocol::OutboundEvent;
use carechat_shared::types::{Conversation, ConversationId, Message, MessageId, Sender};

pub fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, minute, 0).unwrap()
}

pub fn conversation(id: &str, name: &str, minute: u32) -> Conversation {
    Conversation {
        id: ConversationId::from(id),
        display_name: name.to_string(),
        last_activity_at: ts(minute),
    }
}

pub fn message(id: &str, conversation: &str, sender: Sender, content: &str) -> Message {
    Message {
        id: MessageId::from(id),
        conversation_id: ConversationId::from(conversation),
        sender,
        content: content.to_string(),
        timestamp: ts(30),
    }
}

fn scripted_failure() -> ApiError {
    ApiError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "scripted failure"))
}

/// Records everything published; can be switched offline.
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<OutboundEvent>>,
    offline: AtomicBool,
    disconnected: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<OutboundEvent> {
        self.published.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<Message> {
        self.published()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::SendMessage(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn joins(&self) -> Vec<ConversationId> {
        self.published()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::JoinConversation(j) => Some(j.conversation_id),
                _ => None,
            })
            .collect()
    }

    pub fn was_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

impl PushTransport for RecordingTransport {
    fn publish(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.published.lock().unwrap().push(event);
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

/// History API answering from in-memory fixtures.
#[derive(Default)]
pub struct ScriptedHistory {
    conversations: Mutex<Option<Vec<Conversation>>>,
    messages: Mutex<HashMap<ConversationId, Vec<Message>>>,
    failing: Mutex<HashSet<ConversationId>>,
    message_fetches: AtomicUsize,
}

impl ScriptedHistory {
    pub fn new(conversations: Vec<Conversation>) -> Arc<Self> {
        let history = Self::default();
        *history.conversations.lock().unwrap() = Some(conversations);
        Arc::new(history)
    }

    /// A history API whose conversation list request fails.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_messages(&self, id: &str, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(ConversationId::from(id), messages);
    }

    pub fn fail_messages_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(ConversationId::from(id));
    }

    pub fn message_fetches(&self) -> usize {
        self.message_fetches.load(Ordering::SeqCst)
    }
}

impl HistoryApi for ScriptedHistory {
    fn list_conversations(&self) -> BoxFuture<'_, Result<Vec<Conversation>, ApiError>> {
        let result = self
            .conversations
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(scripted_failure);
        futures::future::ready(result).boxed()
    }

    fn list_messages<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, ApiError>> {
        self.message_fetches.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.lock().unwrap().contains(conversation_id) {
            Err(scripted_failure())
        } else {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        };
        futures::future::ready(result).boxed()
    }
}

#[derive(Debug, Clone)]
pub enum UploadScript {
    Url(String),
    MissingUrl,
    NetworkError,
    Panic,
}

/// Uploader returning a fixed scripted response and counting calls.
pub struct ScriptedUploader {
    script: Mutex<UploadScript>,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new(script: UploadScript) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_script(&self, script: UploadScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AttachmentUploader for ScriptedUploader {
    fn upload(&self, _file: AttachmentFile) -> BoxFuture<'static, Result<UploadResponse, ApiError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap().clone();
        async move {
            match script {
                UploadScript::Url(url) => Ok(UploadResponse {
                    file_url: Some(url),
                }),
                UploadScript::MissingUrl => Ok(UploadResponse::default()),
                UploadScript::NetworkError => Err(scripted_failure()),
                UploadScript::Panic => panic!("scripted upload panic"),
            }
        }
        .boxed()
    }
}
