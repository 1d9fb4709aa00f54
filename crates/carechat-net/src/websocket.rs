//! WebSocket push transport.
//!
//! The connection runs in a dedicated tokio task. The session talks to it
//! through a [`WsTransport`] handle (commands in) and a
//! [`TransportNotification`] receiver (events out), mirroring the
//! command/notification split used for the rest of the networking layer.
//! Dropped connections are retried with [`ReconnectPolicy`] backoff; the
//! session is told about each drop and recovery but never has to act on
//! them to keep its state consistent. Frames that were accepted but not
//! written when a connection drops are handed back as
//! [`TransportNotification::Undelivered`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use carechat_shared::protocol::{InboundEvent, OutboundEvent};

use crate::error::TransportError;
use crate::reconnect::ReconnectPolicy;
use crate::transport::{PushTransport, TransportNotification};

const COMMAND_BUFFER: usize = 256;
const NOTIFICATION_BUFFER: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands sent *into* the connection task.
#[derive(Debug)]
enum TransportCommand {
    /// An event and its already-encoded text frame.
    Publish { event: OutboundEvent, frame: String },
    Shutdown,
}

enum PumpExit {
    Shutdown,
    Dropped,
}

/// Handle to a running WebSocket transport task.
#[derive(Debug, Clone)]
pub struct WsTransport {
    cmd_tx: mpsc::Sender<TransportCommand>,
    connected: Arc<AtomicBool>,
}

impl WsTransport {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl PushTransport for WsTransport {
    fn publish(&self, event: OutboundEvent) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let frame = event.encode()?;
        debug!(event = event.name(), len = frame.len(), "Publishing push event");

        self.cmd_tx
            .try_send(TransportCommand::Publish { event, frame })
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::Backpressure,
                TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    fn disconnect(&self) {
        if self.cmd_tx.try_send(TransportCommand::Shutdown).is_err() {
            debug!("Push transport already stopped");
        }
    }
}

/// Spawn the connection task for `url` (`ws://` or `wss://`).
///
/// Returns the publishing handle and the notification stream. The task ends
/// on [`PushTransport::disconnect`] or when the notification receiver is
/// dropped.
pub fn spawn_ws_transport(
    url: String,
    policy: ReconnectPolicy,
) -> (WsTransport, mpsc::Receiver<TransportNotification>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (notif_tx, notif_rx) = mpsc::channel(NOTIFICATION_BUFFER);
    let connected = Arc::new(AtomicBool::new(false));

    tokio::spawn(connection_loop(url, policy, cmd_rx, notif_tx, connected.clone()));

    (WsTransport { cmd_tx, connected }, notif_rx)
}

async fn connection_loop(
    url: String,
    policy: ReconnectPolicy,
    mut cmd_rx: mpsc::Receiver<TransportCommand>,
    notif_tx: mpsc::Sender<TransportNotification>,
    connected: Arc<AtomicBool>,
) {
    let mut attempt: u32 = 0;

    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                info!(url = %url, "Push transport connected");
                attempt = 0;
                connected.store(true, Ordering::Release);

                if notif_tx.send(TransportNotification::Connected).await.is_err() {
                    return;
                }

                let exit = pump(stream, &mut cmd_rx, &notif_tx).await;
                connected.store(false, Ordering::Release);

                match exit {
                    PumpExit::Shutdown => {
                        info!("Push transport shut down");
                        return;
                    }
                    PumpExit::Dropped => {
                        warn!(url = %url, "Push transport connection dropped");
                        if notif_tx.send(TransportNotification::Disconnected).await.is_err() {
                            return;
                        }
                        if !return_pending(&mut cmd_rx, &notif_tx).await {
                            info!("Push transport stopped after connection drop");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, attempt, error = %e, "Push transport connect failed");
            }
        }

        let delay = policy.delay_for_attempt(attempt);
        attempt = attempt.saturating_add(1);

        if !wait_for_retry(delay, &mut cmd_rx, &notif_tx).await {
            info!("Push transport stopped while reconnecting");
            return;
        }
    }
}

/// Hand back every frame still queued when a connection drops.
/// Returns `false` if a shutdown was queued or the session is gone.
async fn return_pending(
    cmd_rx: &mut mpsc::Receiver<TransportCommand>,
    notif_tx: &mpsc::Sender<TransportNotification>,
) -> bool {
    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            TransportCommand::Publish { event, .. } => {
                if !undelivered(event, notif_tx).await {
                    return false;
                }
            }
            TransportCommand::Shutdown => return false,
        }
    }
    true
}

/// Sleep out the backoff delay. Frames that slipped in while the
/// connection was going down are handed back as undelivered.
/// Returns `false` if a shutdown arrived instead.
async fn wait_for_retry(
    delay: std::time::Duration,
    cmd_rx: &mut mpsc::Receiver<TransportCommand>,
    notif_tx: &mpsc::Sender<TransportNotification>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = cmd_rx.recv() => match cmd {
                Some(TransportCommand::Publish { event, .. }) => {
                    if !undelivered(event, notif_tx).await {
                        return false;
                    }
                }
                Some(TransportCommand::Shutdown) | None => return false,
            },
        }
    }
}

async fn undelivered(
    event: OutboundEvent,
    notif_tx: &mpsc::Sender<TransportNotification>,
) -> bool {
    debug!(event = event.name(), "Returning frame published while disconnected");
    notif_tx
        .send(TransportNotification::Undelivered(event))
        .await
        .is_ok()
}

async fn pump(
    stream: WsStream,
    cmd_rx: &mut mpsc::Receiver<TransportCommand>,
    notif_tx: &mpsc::Sender<TransportNotification>,
) -> PumpExit {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(TransportCommand::Publish { event, frame }) => {
                    if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                        warn!(error = %e, "Failed to write push frame");
                        let _ = notif_tx.send(TransportNotification::Undelivered(event)).await;
                        return PumpExit::Dropped;
                    }
                }
                Some(TransportCommand::Shutdown) | None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return PumpExit::Shutdown;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(event) = decode_frame(&text) {
                        if notif_tx.send(TransportNotification::Event(event)).await.is_err() {
                            return PumpExit::Shutdown;
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => return PumpExit::Dropped,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Push transport read failed");
                    return PumpExit::Dropped;
                }
            },
        }
    }
}

/// Validate one inbound text frame, logging and discarding bad ones.
fn decode_frame(text: &str) -> Option<InboundEvent> {
    match InboundEvent::decode(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, len = text.len(), "Dropping malformed push event");
            None
        }
    }
}
