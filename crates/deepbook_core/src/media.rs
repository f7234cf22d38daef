//! Generated image payloads.

use serde::{Deserialize, Serialize};

/// Where a generated image can be found.
///
/// Image providers either host the picture and hand back a URL, or inline
/// it as base64 PNG data.
///
/// # Examples
///
/// ```
/// use deepbook_core::MediaSource;
///
/// let hosted = MediaSource::Url("https://example.com/turtle.png".to_string());
/// assert_eq!(hosted.markdown_target(), "https://example.com/turtle.png");
///
/// let inline = MediaSource::Base64("iVBORw0KGgo".to_string());
/// assert_eq!(inline.markdown_target(), "data:image/png;base64,iVBORw0KGgo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MediaSource {
    /// Image hosted by the provider
    Url(String),
    /// Base64-encoded PNG data
    Base64(String),
}

impl MediaSource {
    /// Link target suitable for a Markdown image reference.
    pub fn markdown_target(&self) -> String {
        match self {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Base64(data) => format!("data:image/png;base64,{data}"),
        }
    }

    /// Whether the payload carries no data.
    pub fn is_empty(&self) -> bool {
        match self {
            MediaSource::Url(s) | MediaSource::Base64(s) => s.trim().is_empty(),
        }
    }
}
