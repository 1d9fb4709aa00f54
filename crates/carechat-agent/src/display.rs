//! Terminal rendering of conversations, messages and session events.

use chrono::{DateTime, Utc};

use carechat_client::SessionEvent;
use carechat_shared::format::{
    absolute_time, classify_content, display_label_for_link, relative_time, ContentKind,
};
use carechat_shared::types::{Conversation, Message, Sender};

pub fn render_conversation(conversation: &Conversation, unread: bool, now: DateTime<Utc>) -> String {
    format!(
        "{} {:<12} {:<24} {}",
        if unread { "*" } else { " " },
        conversation.id.as_str(),
        conversation.display_name,
        relative_time(conversation.last_activity_at, now),
    )
}

pub fn render_message(message: &Message, now: DateTime<Utc>) -> String {
    let who = match message.sender {
        Sender::Operator => "you",
        Sender::Counterparty => "them",
    };
    let body = match classify_content(&message.content) {
        ContentKind::Text => message.content.clone(),
        ContentKind::Link => format!("[file] {}", display_label_for_link(&message.content)),
        ContentKind::Image => format!("[image] {}", display_label_for_link(&message.content)),
    };
    let pending = if message.id.is_provisional() { " (sending)" } else { "" };

    format!(
        "[{} | {}] {who}: {body}{pending}",
        absolute_time(message.timestamp),
        relative_time(message.timestamp, now),
    )
}

/// One-line description of events that are not redrawn from a query.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    let line = match event {
        SessionEvent::UnreadChanged {
            conversation_id,
            unread: true,
        } => format!("* new activity in {conversation_id}"),
        SessionEvent::TypingChanged {
            conversation_id,
            is_typing: true,
        } => format!("... {conversation_id} is typing"),
        SessionEvent::LoadFailed {
            conversation_id,
            reason,
        } => match conversation_id {
            Some(id) => format!("! could not load history for {id}: {reason}"),
            None => format!("! could not load conversations: {reason}"),
        },
        SessionEvent::AttachmentSelected { file_name, size } => {
            format!("staged {file_name} ({size} bytes), /send to upload")
        }
        SessionEvent::AttachmentRejected {
            file_name,
            size,
            max,
        } => format!("! {file_name} is {size} bytes, limit is {max}"),
        SessionEvent::UploadFailed {
            file_name, reason, ..
        } => format!("! upload of {file_name} failed: {reason}"),
        SessionEvent::SendFailed { reason, .. } => format!("! message not sent: {reason}"),
        SessionEvent::ConnectionChanged { connected: true } => "(connected)".to_string(),
        SessionEvent::ConnectionChanged { connected: false } => "(disconnected, retrying)".to_string(),
        _ => return None,
    };
    Some(line)
}
