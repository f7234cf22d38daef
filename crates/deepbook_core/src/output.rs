//! Output types from model responses.

use serde::{Deserialize, Serialize};

/// A single piece of content returned by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Output {
    /// Plain text output.
    Text(String),

    /// Structured JSON output, returned by providers with native schema support.
    Json(serde_json::Value),
}

impl Output {
    /// Text content of this output, rendering JSON compactly.
    pub fn as_text(&self) -> String {
        match self {
            Output::Text(text) => text.clone(),
            Output::Json(value) => value.to_string(),
        }
    }
}
