//! # carechat-client
//!
//! The operator-side session of the support chat: which conversation is
//! open, what is unread, who is typing, and how messages and attachments
//! leave the console. A [`SessionController`] owns all of it and runs as a
//! single task; front ends talk to it through a [`SessionHandle`] and
//! watch [`SessionEvent`]s.

pub mod attachments;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod state;
pub mod typing;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use commands::{SessionCommand, SessionHandle};
pub use config::{ClientConfig, SendFailurePolicy};
pub use error::{AttachmentError, ConfigError, SessionError};
pub use events::{EventSink, SessionEvent};
pub use session::SessionController;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("carechat_client=debug,carechat_net=debug,carechat_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
