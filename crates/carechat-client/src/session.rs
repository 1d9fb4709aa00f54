//! The conversation session controller.
//!
//! Owns which conversation is active, routes every inbound transport event
//! and every operator action to the registry, unread set, message log,
//! typing indicator and attachment pipeline, and publishes outward through
//! the injected [`PushTransport`].
//!
//! All mutation happens on one task: [`SessionController::run`] serialises
//! commands, transport notifications, upload completions and the typing
//! deadline through a single `select!` loop. The only awaits inside a turn
//! are the history fetches.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use carechat_net::{
    AttachmentFile, AttachmentUploader, HistoryApi, PushTransport, TransportNotification,
};
use carechat_shared::clock::{Clock, SystemClock};
use carechat_shared::protocol::{InboundEvent, JoinConversation, OutboundEvent};
use carechat_shared::types::{Conversation, ConversationId, Message, Sender, TypingSignal};
use carechat_store::{MessageLog, Upsert};

use crate::attachments::{AttachmentPipeline, UploadOutcome};
use crate::commands::{SessionCommand, SessionHandle};
use crate::config::{ClientConfig, SendFailurePolicy};
use crate::error::AttachmentError;
use crate::events::{EventSink, SessionEvent};
use crate::state::{ActiveConversation, SessionState};

const COMMAND_BUFFER: usize = 64;

pub struct SessionController {
    identity: String,
    typing_decay: Duration,
    send_failure_policy: SendFailurePolicy,
    transport: Arc<dyn PushTransport>,
    history: Arc<dyn HistoryApi>,
    clock: Arc<dyn Clock>,
    state: SessionState,
    attachments: AttachmentPipeline,
    upload_rx: mpsc::UnboundedReceiver<UploadOutcome>,
    outbox: VecDeque<Message>,
    events: EventSink,
}

impl SessionController {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn PushTransport>,
        history: Arc<dyn HistoryApi>,
        uploader: Arc<dyn AttachmentUploader>,
        events: EventSink,
    ) -> Self {
        let (attachments, upload_rx) =
            AttachmentPipeline::new(uploader, config.max_attachment_bytes);

        Self {
            identity: config.identity.clone(),
            typing_decay: config.typing_decay,
            send_failure_policy: config.send_failure_policy,
            transport,
            history,
            clock: Arc::new(SystemClock),
            state: SessionState::new(config.history_cache),
            attachments,
            upload_rx,
            outbox: VecDeque::new(),
            events,
        }
    }

    /// Replace the wall clock used for message timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Run the session on its own task.
    pub fn spawn(
        self,
        notifications: mpsc::Receiver<TransportNotification>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(self.run(notifications, cmd_rx));
        (SessionHandle::new(cmd_tx), task)
    }

    /// Cold start, then process events until shutdown.
    ///
    /// Ends on [`SessionCommand::Shutdown`] or when every command sender is
    /// gone, disconnecting the transport on the way out.
    pub async fn run(
        mut self,
        mut notifications: mpsc::Receiver<TransportNotification>,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) {
        self.start().await;

        let mut transport_open = true;
        info!("Session loop started");

        loop {
            let typing_deadline = self.typing_deadline();

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                notification = notifications.recv(), if transport_open => match notification {
                    Some(notification) => self.handle_notification(notification),
                    None => {
                        warn!("Push transport notification stream closed");
                        transport_open = false;
                    }
                },
                Some(outcome) = self.upload_rx.recv() => self.resolve_upload(outcome),
                _ = tokio::time::sleep_until(typing_deadline.unwrap_or_else(Instant::now)),
                    if typing_deadline.is_some() => self.expire_typing(Instant::now()),
            }
        }

        self.transport.disconnect();
        info!("Session loop stopped");
    }

    /// Seed the registry from the history API. A failed fetch leaves the
    /// registry empty and is reported as [`SessionEvent::LoadFailed`].
    pub async fn start(&mut self) {
        match self.history.list_conversations().await {
            Ok(conversations) => {
                info!(count = conversations.len(), "Conversation list loaded");
                self.state.registry.replace_all(conversations);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load conversation list");
                self.state.registry.replace_all(Vec::new());
                self.events.emit(SessionEvent::LoadFailed {
                    conversation_id: None,
                    reason: e.to_string(),
                });
            }
        }
        self.events.emit(SessionEvent::ConversationsChanged);
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Open(id) => self.open(id).await,
            SessionCommand::SelectAttachment(file) => {
                // Rejections are already reported as events.
                let _ = self.select_attachment(file);
            }
            SessionCommand::DiscardAttachment => self.discard_attachment(),
            SessionCommand::Send { text } => self.send(text),
            SessionCommand::Typing => self.send_typing(),
            SessionCommand::ListConversations { term, reply } => {
                let _ = reply.send(self.conversations(&term));
            }
            SessionCommand::ListMessages { reply } => {
                let _ = reply.send(self.messages().to_vec());
            }
            SessionCommand::Shutdown => {}
        }
    }

    // -----------------------------------------------------------------------
    // Opening a conversation
    // -----------------------------------------------------------------------

    /// Make `id` the active conversation.
    ///
    /// Tears down the previous conversation's scope (its typing timer goes
    /// with it), clears the unread flag, joins the room, then loads history.
    /// A failed history fetch leaves an empty log.
    pub async fn open(&mut self, id: ConversationId) {
        let now = Instant::now();

        if let Some(previous) = self.state.active.take() {
            // An armed deadline means the UI was last told "typing", even if
            // it has elapsed and `expire_typing` has not run yet.
            if previous.typing.deadline().is_some() {
                self.events.emit(SessionEvent::TypingChanged {
                    conversation_id: previous.id.clone(),
                    is_typing: false,
                });
            }
            self.state.cache.store(previous.log, now.into_std());
        }

        self.state.active = Some(ActiveConversation::new(id.clone(), self.typing_decay));

        if self.state.unread.clear(&id) {
            self.events.emit(SessionEvent::UnreadChanged {
                conversation_id: id.clone(),
                unread: false,
            });
        }

        self.join(&id);

        let log = match self.state.cache.take_fresh(&id, now.into_std()) {
            Some(log) => {
                debug!(conversation = %id, "Conversation restored from history cache");
                log
            }
            None => self.fetch_log(&id).await,
        };

        let count = log.len();
        if let Some(active) = self.state.active_if(&id) {
            active.log = log;
        }

        info!(conversation = %id, messages = count, "Conversation opened");
        self.events.emit(SessionEvent::MessagesChanged {
            conversation_id: id,
        });
    }

    async fn fetch_log(&self, id: &ConversationId) -> MessageLog {
        match self.history.list_messages(id).await {
            Ok(history) => MessageLog::from_history(id.clone(), history),
            Err(e) => {
                warn!(conversation = %id, error = %e, "Failed to load message history");
                self.events.emit(SessionEvent::LoadFailed {
                    conversation_id: Some(id.clone()),
                    reason: e.to_string(),
                });
                MessageLog::new(id.clone())
            }
        }
    }

    fn join(&self, id: &ConversationId) {
        let event = OutboundEvent::JoinConversation(JoinConversation {
            conversation_id: id.clone(),
            identity: self.identity.clone(),
        });
        if let Err(e) = self.transport.publish(event) {
            warn!(conversation = %id, error = %e, "Failed to join conversation room");
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    pub fn handle_notification(&mut self, notification: TransportNotification) {
        match notification {
            TransportNotification::Connected => {
                info!("Push transport connected");
                self.events
                    .emit(SessionEvent::ConnectionChanged { connected: true });
                if let Some(id) = self.state.active_id().cloned() {
                    self.join(&id);
                }
                self.flush_outbox();
            }
            TransportNotification::Disconnected => {
                warn!("Push transport disconnected");
                self.events
                    .emit(SessionEvent::ConnectionChanged { connected: false });
            }
            TransportNotification::Event(event) => self.handle_inbound(event),
            TransportNotification::Undelivered(OutboundEvent::SendMessage(message)) => {
                self.apply_send_failure(message, "Connection lost before delivery".to_string());
            }
            TransportNotification::Undelivered(event) => {
                // Joins are repeated on reconnect; typing signals are stale.
                debug!(event = event.name(), "Dropping undelivered push event");
            }
        }
    }

    pub fn handle_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::ReceiveMessage(message) => self.on_receive_message(message),
            InboundEvent::Typing(signal) => self.on_typing(signal),
            InboundEvent::NewConversation(conversation) => self.on_new_conversation(conversation),
        }
    }

    fn on_receive_message(&mut self, message: Message) {
        // The local copy inserted at send time is authoritative.
        if message.sender == Sender::Operator {
            debug!(msg_id = %message.id, "Ignoring echo of own message");
            return;
        }

        let conversation_id = message.conversation_id.clone();

        if self
            .state
            .registry
            .touch(&conversation_id, message.timestamp)
        {
            self.events.emit(SessionEvent::ConversationsChanged);
        }

        if let Some(active) = self.state.active_if(&conversation_id) {
            if active.log.append(message) {
                self.events.emit(SessionEvent::MessagesChanged { conversation_id });
            }
            return;
        }

        self.state.cache.invalidate(&conversation_id);
        if self.state.unread.mark(conversation_id.clone()) {
            debug!(conversation = %conversation_id, "Conversation marked unread");
            self.events.emit(SessionEvent::UnreadChanged {
                conversation_id,
                unread: true,
            });
        }
    }

    fn on_typing(&mut self, signal: TypingSignal) {
        if signal.sender == Sender::Operator {
            return;
        }

        let now = Instant::now();
        let Some(active) = self.state.active_if(&signal.conversation_id) else {
            debug!(conversation = %signal.conversation_id, "Typing signal for inactive conversation");
            return;
        };

        if active.typing.arm(now) {
            self.events.emit(SessionEvent::TypingChanged {
                conversation_id: signal.conversation_id,
                is_typing: true,
            });
        }
    }

    fn on_new_conversation(&mut self, conversation: Conversation) {
        let id = conversation.id.clone();

        match self.state.registry.upsert_from_push(conversation) {
            Upsert::Inserted => {
                info!(conversation = %id, "New conversation");
                self.events.emit(SessionEvent::ConversationsChanged);

                if !self.state.is_active(&id) && self.state.unread.mark(id.clone()) {
                    self.events.emit(SessionEvent::UnreadChanged {
                        conversation_id: id,
                        unread: true,
                    });
                }
            }
            Upsert::AlreadyKnown => {}
        }
    }

    /// Drop the typing indicator if its deadline has passed.
    pub fn expire_typing(&mut self, now: Instant) {
        let Some(active) = self.state.active.as_mut() else {
            return;
        };
        if active.typing.expire(now) {
            self.events.emit(SessionEvent::TypingChanged {
                conversation_id: active.id.clone(),
                is_typing: false,
            });
        }
    }

    fn typing_deadline(&self) -> Option<Instant> {
        self.state.active.as_ref().and_then(|a| a.typing.deadline())
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// One send gesture. The text and the staged attachment are independent:
    /// each has its own success and failure path.
    pub fn send(&mut self, text: Option<String>) {
        if self.state.active.is_none() {
            warn!("Send with no active conversation ignored");
            return;
        }

        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            self.send_text(text);
        }
        if let Some(file) = self.attachments.discard() {
            self.send_attachment(file);
        }
    }

    /// Append a text message locally, then publish it.
    pub fn send_text(&mut self, text: String) {
        let now = self.clock.now();
        let Some(active) = self.state.active.as_mut() else {
            warn!("Send with no active conversation ignored");
            return;
        };

        let message = Message::outgoing(active.id.clone(), text, now);
        active.log.append(message.clone());

        let conversation_id = message.conversation_id.clone();
        if self.state.registry.touch(&conversation_id, now) {
            self.events.emit(SessionEvent::ConversationsChanged);
        }
        self.events
            .emit(SessionEvent::MessagesChanged { conversation_id });

        self.publish_message(message);
    }

    /// Forward the operator's typing to the transport. Never touches the
    /// local indicator.
    pub fn send_typing(&self) {
        let Some(id) = self.state.active_id() else {
            return;
        };
        let event = OutboundEvent::Typing(TypingSignal {
            sender: Sender::Operator,
            conversation_id: id.clone(),
        });
        if let Err(e) = self.transport.publish(event) {
            debug!(error = %e, "Typing signal not sent");
        }
    }

    fn publish_message(&mut self, message: Message) {
        let error = match self
            .transport
            .publish(OutboundEvent::SendMessage(message.clone()))
        {
            Ok(()) => {
                debug!(msg_id = %message.id, "Message published");
                return;
            }
            Err(e) => e,
        };

        self.apply_send_failure(message, error.to_string());
    }

    /// Handle a message that did not reach the server, whether publish
    /// refused it or the transport lost it after accepting it.
    fn apply_send_failure(&mut self, message: Message, reason: String) {
        match self.send_failure_policy {
            SendFailurePolicy::KeepOptimistic => {
                warn!(msg_id = %message.id, reason = %reason, "Send failed, keeping local copy");
            }
            SendFailurePolicy::Rollback => {
                warn!(msg_id = %message.id, reason = %reason, "Send failed, rolling back local copy");
                let conversation_id = message.conversation_id.clone();
                if let Some(active) = self.state.active_if(&conversation_id) {
                    if active.log.remove(&message.id).is_some() {
                        self.events.emit(SessionEvent::MessagesChanged {
                            conversation_id: conversation_id.clone(),
                        });
                    }
                }
                self.events.emit(SessionEvent::SendFailed {
                    conversation_id,
                    message_id: message.id,
                    reason,
                });
            }
            SendFailurePolicy::StoreAndForward => {
                info!(msg_id = %message.id, reason = %reason, "Send failed, queued until reconnect");
                self.outbox.push_back(message);
            }
        }
    }

    fn flush_outbox(&mut self) {
        if !self.outbox.is_empty() {
            info!(queued = self.outbox.len(), "Flushing outbox");
        }

        while let Some(message) = self.outbox.pop_front() {
            if let Err(e) = self
                .transport
                .publish(OutboundEvent::SendMessage(message.clone()))
            {
                warn!(msg_id = %message.id, error = %e, "Outbox flush interrupted");
                self.outbox.push_front(message);
                break;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Attachments
    // -----------------------------------------------------------------------

    /// Stage a file for the next send; oversized files are refused.
    pub fn select_attachment(&mut self, file: AttachmentFile) -> Result<(), AttachmentError> {
        let (file_name, size) = (file.name.clone(), file.size());

        match self.attachments.select(file) {
            Ok(()) => {
                self.events
                    .emit(SessionEvent::AttachmentSelected { file_name, size });
                Ok(())
            }
            Err(e) => {
                warn!(file_name = %file_name, error = %e, "Attachment rejected");
                match &e {
                    AttachmentError::TooLarge { size, max } => {
                        self.events.emit(SessionEvent::AttachmentRejected {
                            file_name,
                            size: *size,
                            max: *max,
                        });
                    }
                }
                Err(e)
            }
        }
    }

    pub fn discard_attachment(&mut self) {
        if let Some(file) = self.attachments.discard() {
            debug!(file_name = %file.name, "Attachment discarded");
        }
    }

    fn send_attachment(&mut self, file: AttachmentFile) {
        let now = self.clock.now();
        let Some(active) = self.state.active.as_mut() else {
            return;
        };

        let placeholder = Message::placeholder(active.id.clone(), &file.name, now);
        active.log.append(placeholder.clone());
        self.events.emit(SessionEvent::MessagesChanged {
            conversation_id: placeholder.conversation_id.clone(),
        });

        self.attachments.begin(file, &placeholder);
    }

    /// Resolve a finished upload's placeholder.
    ///
    /// On success the placeholder is swapped in place for the final message,
    /// which is then published. On failure the placeholder is removed. If the
    /// operator has since switched away the log is gone; the final message is
    /// still published and any cached copy of that log is dropped.
    pub fn resolve_upload(&mut self, outcome: UploadOutcome) {
        self.attachments.finish(&outcome.placeholder_id);

        let UploadOutcome {
            conversation_id,
            placeholder_id,
            file_name,
            result,
        } = outcome;

        if !self.state.is_active(&conversation_id) {
            self.state.cache.invalidate(&conversation_id);
        }

        match result {
            Ok(url) => {
                let message = Message::outgoing(conversation_id.clone(), url, self.clock.now());
                info!(file_name = %file_name, msg_id = %message.id, "Attachment uploaded");

                if let Some(active) = self.state.active_if(&conversation_id) {
                    active.log.replace(&placeholder_id, message.clone());
                    self.events
                        .emit(SessionEvent::MessagesChanged { conversation_id });
                }
                self.publish_message(message);
            }
            Err(reason) => {
                warn!(file_name = %file_name, reason = %reason, "Attachment upload failed");

                if let Some(active) = self.state.active_if(&conversation_id) {
                    if active.log.remove(&placeholder_id).is_some() {
                        self.events.emit(SessionEvent::MessagesChanged {
                            conversation_id: conversation_id.clone(),
                        });
                    }
                }
                self.events.emit(SessionEvent::UploadFailed {
                    conversation_id,
                    file_name,
                    reason,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn conversations(&self, term: &str) -> Vec<Conversation> {
        self.state.registry.list(term).into_iter().cloned().collect()
    }

    /// Messages of the active conversation, in arrival order.
    pub fn messages(&self) -> &[Message] {
        self.state
            .active
            .as_ref()
            .map(|a| a.log.messages())
            .unwrap_or(&[])
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.state.active_id()
    }

    pub fn is_unread(&self, id: &ConversationId) -> bool {
        self.state.unread.is_unread(id)
    }

    /// Whether the counterparty of the active conversation is typing.
    pub fn is_typing(&self, now: Instant) -> bool {
        self.state
            .active
            .as_ref()
            .map_or(false, |a| a.typing.is_typing(now))
    }

    pub fn pending_attachment(&self) -> Option<&AttachmentFile> {
        self.attachments.selected()
    }

    pub fn uploads_in_flight(&self) -> usize {
        self.attachments.in_flight()
    }

    pub fn queued_messages(&self) -> usize {
        self.outbox.len()
    }
}
