//! Collaborator clients for the support-chat core: the push transport
//! (WebSocket), the conversation history API and the attachment upload
//! API (HTTP).
//!
//! Each collaborator sits behind a trait so the session controller can be
//! driven by test doubles.

pub mod error;
pub mod history;
pub mod reconnect;
pub mod transport;
pub mod upload;
pub mod websocket;

pub use error::{ApiError, TransportError};
pub use history::{HistoryApi, HttpHistoryApi};
pub use reconnect::ReconnectPolicy;
pub use transport::{PushTransport, TransportNotification};
pub use upload::{AttachmentFile, AttachmentUploader, HttpUploader, UploadResponse};
pub use websocket::{spawn_ws_transport, WsTransport};
