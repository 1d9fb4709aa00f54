/// Largest attachment accepted at selection time (5 MiB).
pub const MAX_ATTACHMENT_SIZE: usize = 5 * 1024 * 1024;

/// How long an inbound typing signal keeps the indicator lit.
pub const TYPING_DECAY_MS: u64 = 3_000;

/// Prefix marking a message id as provisional (an in-flight upload).
pub const PROVISIONAL_ID_PREFIX: &str = "pending-";

/// Raster image extensions rendered inline rather than as a link.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Push transport event names.
pub const EVENT_RECEIVE_MESSAGE: &str = "receive_message";
pub const EVENT_TYPING: &str = "typing";
pub const EVENT_NEW_CONVERSATION: &str = "new_conversation";
pub const EVENT_JOIN_CONVERSATION: &str = "join_conversation";
pub const EVENT_SEND_MESSAGE: &str = "send_message";
