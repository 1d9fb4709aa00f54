use thiserror::Error;

/// Reasons a selected attachment is refused before any upload starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown send failure policy: {0}")]
    UnknownPolicy(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session has stopped")]
    Closed,
}
