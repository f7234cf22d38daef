//! Request and response types for text generation.

use crate::{Message, Output};
use deepbook_error::{DeepbookResult, ProviderError, ProviderErrorKind};
use serde::{Deserialize, Serialize};

/// Provider-neutral text generation request.
///
/// # Examples
///
/// ```
/// use deepbook_core::{GenerateRequest, Message};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::user("Hello!")])
///     .max_tokens(Some(100))
///     .temperature(Some(0.7))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages().len(), 1);
/// assert_eq!(*request.max_tokens(), Some(100));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    messages: Vec<Message>,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 2.0)
    temperature: Option<f32>,
    /// Model identifier override
    model: Option<String>,
}

impl GenerateRequest {
    /// Creates a new builder for `GenerateRequest`.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }

    /// Request consisting of a single user prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            ..Default::default()
        }
    }

    /// Concatenated text of all user messages.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| *m.role() == crate::Role::User)
            .map(|m| m.content().as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use deepbook_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse::new(vec![Output::Text("Once upon a time".to_string())]);
/// assert_eq!(response.text().unwrap(), "Once upon a time");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    outputs: Vec<Output>,
}

impl GenerateResponse {
    /// Wrap model outputs.
    pub fn new(outputs: Vec<Output>) -> Self {
        Self { outputs }
    }

    /// All outputs joined as text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::EmptyResponse`] when the response holds no
    /// output at all.
    pub fn text(&self) -> DeepbookResult<String> {
        if self.outputs.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse).into());
        }
        Ok(self
            .outputs
            .iter()
            .map(Output::as_text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
