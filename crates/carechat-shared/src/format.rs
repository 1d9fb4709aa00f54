//! Pure display helpers: content classification and timestamp strings.
//!
//! Nothing in here fails. Content that does not look like an attachment URL
//! is text, and a link whose path yields no label falls back to its host.

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::constants::IMAGE_EXTENSIONS;

/// How a message's content should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Link,
    Image,
}

/// Classify message content by shape.
///
/// Content is a link when it parses as an absolute `http`/`https` URL with a
/// host, and an image when that URL's last path segment carries one of
/// [`IMAGE_EXTENSIONS`] (case-insensitive).
pub fn classify_content(content: &str) -> ContentKind {
    let Some(url) = parse_attachment_url(content) else {
        return ContentKind::Text;
    };

    let is_image = last_segment(&url)
        .and_then(|segment| segment.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    if is_image {
        ContentKind::Image
    } else {
        ContentKind::Link
    }
}

/// Label shown for a link: its last path segment, percent-decoded, or the
/// host when the path is empty. Unparseable input is returned unchanged.
pub fn display_label_for_link(content: &str) -> String {
    let Some(url) = parse_attachment_url(content) else {
        return content.to_string();
    };

    match last_segment(&url) {
        Some(segment) => segment,
        None => url.host_str().unwrap_or(content).to_string(),
    }
}

/// Compact age of `timestamp` relative to `now`: minutes under an hour,
/// hours under a day, otherwise the calendar date.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes().max(0);

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if elapsed.num_hours() < 24 {
        format!("{} h ago", elapsed.num_hours())
    } else {
        timestamp.format("%b %-d, %Y").to_string()
    }
}

/// Full timestamp, e.g. for a tooltip.
pub fn absolute_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

fn parse_attachment_url(content: &str) -> Option<Url> {
    let url = Url::parse(content.trim()).ok()?;
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host_str().is_some()).then_some(url)
}

fn last_segment(url: &Url) -> Option<String> {
    let raw = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(percent_decode_str(raw).decode_utf8_lossy().into_owned())
}
