use thiserror::Error;

/// Failures publishing over the push transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Push transport is not connected")]
    NotConnected,

    #[error("Push transport has shut down")]
    Closed,

    #[error("Push transport send buffer is full")]
    Backpressure,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures talking to the history or upload HTTP APIs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API URL cannot carry a path: {0}")]
    NotABase(String),

    #[error("Upload response did not include a file URL")]
    MissingFileUrl,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
