use thiserror::Error;

/// A push-transport payload that failed validation at the boundary.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed event frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown event type: {0}")]
    UnknownEvent(String),
}
