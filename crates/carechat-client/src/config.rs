//! Client configuration loaded from environment variables.
//!
//! All settings have defaults that point at a local development server, so
//! the client starts with zero configuration.

use std::str::FromStr;
use std::time::Duration;

use carechat_shared::constants::{MAX_ATTACHMENT_SIZE, TYPING_DECAY_MS};
use carechat_store::CachePolicy;

use crate::error::ConfigError;

/// What to do with an optimistically shown text message whose publish failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendFailurePolicy {
    /// Leave the local copy in place and move on.
    #[default]
    KeepOptimistic,
    /// Remove the local copy and report the failure.
    Rollback,
    /// Leave the local copy and queue the message until the transport
    /// reconnects.
    StoreAndForward,
}

impl FromStr for SendFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep-optimistic" => Ok(Self::KeepOptimistic),
            "rollback" => Ok(Self::Rollback),
            "store-and-forward" | "outbox" => Ok(Self::StoreAndForward),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the conversation history API.
    /// Env: `CARECHAT_API_URL`
    pub api_url: String,

    /// Attachment upload endpoint.
    /// Env: `CARECHAT_UPLOAD_URL`
    pub upload_url: String,

    /// WebSocket URL of the push transport.
    /// Env: `CARECHAT_PUSH_URL`
    pub push_url: String,

    /// Identity announced when joining a conversation room.
    /// Env: `CARECHAT_IDENTITY`
    pub identity: String,

    /// Largest attachment accepted at selection time.
    /// Env: `CARECHAT_MAX_ATTACHMENT_BYTES`
    pub max_attachment_bytes: usize,

    /// How long an inbound typing signal stays visible.
    /// Env: `CARECHAT_TYPING_DECAY_MS`
    pub typing_decay: Duration,

    /// Env: `CARECHAT_SEND_FAILURE_POLICY` (`keep` / `rollback` / `store-and-forward`)
    pub send_failure_policy: SendFailurePolicy,

    /// Env: `CARECHAT_HISTORY_CACHE_SIZE` (0 disables),
    /// `CARECHAT_HISTORY_CACHE_TTL_SECS`
    pub history_cache: CachePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".to_string(),
            upload_url: "http://127.0.0.1:8080/api/upload".to_string(),
            push_url: "ws://127.0.0.1:8080/ws".to_string(),
            identity: "operator".to_string(),
            max_attachment_bytes: MAX_ATTACHMENT_SIZE,
            typing_decay: Duration::from_millis(TYPING_DECAY_MS),
            send_failure_policy: SendFailurePolicy::default(),
            history_cache: CachePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("CARECHAT_API_URL") {
            config.api_url = url;
        }

        if let Some(url) = lookup("CARECHAT_UPLOAD_URL") {
            config.upload_url = url;
        }

        if let Some(url) = lookup("CARECHAT_PUSH_URL") {
            config.push_url = url;
        }

        if let Some(identity) = lookup("CARECHAT_IDENTITY") {
            if !identity.is_empty() {
                config.identity = identity;
            }
        }

        if let Some(val) = lookup("CARECHAT_MAX_ATTACHMENT_BYTES") {
            match val.parse::<usize>() {
                Ok(n) => config.max_attachment_bytes = n,
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CARECHAT_MAX_ATTACHMENT_BYTES, using default")
                }
            }
        }

        if let Some(val) = lookup("CARECHAT_TYPING_DECAY_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.typing_decay = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CARECHAT_TYPING_DECAY_MS, using default")
                }
            }
        }

        if let Some(val) = lookup("CARECHAT_SEND_FAILURE_POLICY") {
            match val.parse::<SendFailurePolicy>() {
                Ok(policy) => config.send_failure_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid CARECHAT_SEND_FAILURE_POLICY, using default"),
            }
        }

        if let Some(val) = lookup("CARECHAT_HISTORY_CACHE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) => config.history_cache.capacity = n,
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CARECHAT_HISTORY_CACHE_SIZE, using default")
                }
            }
        }

        if let Some(val) = lookup("CARECHAT_HISTORY_CACHE_TTL_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => config.history_cache.ttl = Duration::from_secs(secs),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CARECHAT_HISTORY_CACHE_TTL_SECS, using default")
                }
            }
        }

        // RUST_LOG is read directly by tracing-subscriber's EnvFilter.

        config
    }
}
