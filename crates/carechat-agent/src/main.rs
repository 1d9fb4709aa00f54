//! # carechat-agent
//!
//! Terminal operator console for the support chat. Wires the HTTP history
//! and upload clients and the WebSocket push transport into a
//! [`SessionController`], then drives it from stdin:
//!
//! - `/open <id>`, `/list [term]` to navigate conversations
//! - `/attach <path>`, `/discard`, `/send [text]` for files
//! - `/typing`, and any other line is sent as a message
//!
//! Exits on `/quit`, end of input or Ctrl+C.

mod display;
mod input;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use carechat_client::{ClientConfig, EventSink, SessionController, SessionEvent, SessionHandle};
use carechat_net::{spawn_ws_transport, AttachmentFile, HttpHistoryApi, HttpUploader, ReconnectPolicy};
use carechat_shared::types::ConversationId;

use crate::input::{parse_line, AgentCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    carechat_client::init_tracing();

    info!("Starting carechat agent v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Build collaborators
    // -----------------------------------------------------------------------
    let http = reqwest::Client::new();
    let history = HttpHistoryApi::new(http.clone(), &config.api_url)
        .context("Invalid CARECHAT_API_URL")?;
    let uploader = HttpUploader::new(http, &config.upload_url)
        .context("Invalid CARECHAT_UPLOAD_URL")?;
    let (transport, notifications) =
        spawn_ws_transport(config.push_url.clone(), ReconnectPolicy::default());

    // -----------------------------------------------------------------------
    // 4. Spawn the session and the event printer
    // -----------------------------------------------------------------------
    let (events, event_rx) = EventSink::channel();
    let controller = SessionController::new(
        &config,
        Arc::new(transport),
        Arc::new(history),
        Arc::new(uploader),
        events,
    );
    let (handle, session_task) = controller.spawn(notifications);

    let unread = Arc::new(Mutex::new(HashSet::new()));
    tokio::spawn(print_events(event_rx, handle.clone(), unread.clone()));

    // -----------------------------------------------------------------------
    // 5. Read operator input until EOF, /quit or Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = read_input(handle.clone(), unread) => {
            if let Err(e) = result {
                error!(error = %e, "Input loop failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    if handle.shutdown().await.is_err() {
        debug!("Session already stopped");
    }
    session_task.await.context("Session task failed")?;

    Ok(())
}

type UnreadSet = Arc<Mutex<HashSet<ConversationId>>>;

async fn read_input(handle: SessionHandle, unread: UnreadSet) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            AgentCommand::Open(id) => handle.open(ConversationId::new(id)).await?,
            AgentCommand::List(term) => {
                let conversations = handle.conversations(&term).await?;
                let unread = unread.lock().await;
                let now = Utc::now();
                for conversation in &conversations {
                    let flag = unread.contains(&conversation.id);
                    println!("{}", display::render_conversation(conversation, flag, now));
                }
            }
            AgentCommand::Attach(path) => match AttachmentFile::from_path(&path).await {
                Ok(file) => handle.select_attachment(file).await?,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read attachment");
                    println!("! cannot read {}: {e}", path.display());
                }
            },
            AgentCommand::Discard => handle.discard_attachment().await?,
            AgentCommand::Typing => handle.typing().await?,
            AgentCommand::Send(text) => handle.send_message(text).await?,
            AgentCommand::Help => println!("{}", input::HELP),
            AgentCommand::Quit => break,
        }
    }

    info!("Input closed");
    Ok(())
}

/// Print session events. Message changes redraw the new tail of the log
/// from a query; everything else is a one-line notice.
async fn print_events(
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    handle: SessionHandle,
    unread: UnreadSet,
) {
    let mut shown: Option<(ConversationId, usize)> = None;

    while let Some(event) = events.recv().await {
        match &event {
            SessionEvent::UnreadChanged {
                conversation_id,
                unread: flag,
            } => {
                let mut unread = unread.lock().await;
                if *flag {
                    unread.insert(conversation_id.clone());
                } else {
                    unread.remove(conversation_id);
                }
            }
            SessionEvent::MessagesChanged { conversation_id } => {
                let Ok(messages) = handle.messages().await else {
                    break;
                };

                // Redraw everything on a switch or when the log shrank.
                let skip = match &shown {
                    Some((id, count)) if id == conversation_id && *count <= messages.len() => *count,
                    _ => {
                        println!("--- {conversation_id} ---");
                        0
                    }
                };

                let now = Utc::now();
                for message in &messages[skip..] {
                    println!("{}", display::render_message(message, now));
                }
                shown = Some((conversation_id.clone(), messages.len()));
            }
            _ => {}
        }

        if let Some(line) = display::render_event(&event) {
            println!("{line}");
        }
    }
}
