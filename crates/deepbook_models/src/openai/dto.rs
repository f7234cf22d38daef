//! OpenAI API data transfer objects.

use deepbook_core::Role;
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatMessage {
    /// Message role
    role: Role,
    /// Message text
    content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// JSON Schema payload for structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct JsonSchemaFormat {
    /// Schema name (letters, digits, `_` and `-`)
    name: String,
    /// The JSON Schema itself
    schema: Value,
    /// Whether the provider must follow the schema exactly
    strict: bool,
}

impl JsonSchemaFormat {
    /// Create a strict schema format.
    pub fn new_strict(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// Requested shape of the completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// Any JSON object
    JsonObject,
    /// JSON conforming to a schema
    JsonSchema {
        /// The schema
        json_schema: JsonSchemaFormat,
    },
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    /// Model identifier
    model: String,
    /// Conversation
    messages: Vec<ChatMessage>,
    /// Completion token cap
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Output shape
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl ChatCompletionRequest {
    /// Creates a new builder for `ChatCompletionRequest`.
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }
}

/// Assistant message inside a completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ResponseMessage {
    /// Generated text
    #[serde(default)]
    content: Option<String>,
    /// Refusal text, when the model declined a structured request
    #[serde(default)]
    refusal: Option<String>,
}

/// One completion alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Choice {
    /// The generated message
    message: ResponseMessage,
    /// Why generation stopped
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Usage {
    /// Prompt tokens consumed
    #[serde(default)]
    prompt_tokens: u64,
    /// Completion tokens generated
    #[serde(default)]
    completion_tokens: u64,
}

/// Chat completion response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ChatCompletionResponse {
    /// Completion alternatives
    #[serde(default)]
    choices: Vec<Choice>,
    /// Usage statistics, when reported
    #[serde(default)]
    usage: Option<Usage>,
}

/// Image generation request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ImageGenerationRequest {
    /// Image model identifier
    model: String,
    /// Picture description
    prompt: String,
    /// Number of images
    n: u8,
    /// Dimensions, e.g. `1024x1024`
    size: String,
    /// `standard` or `hd`
    quality: String,
}

impl ImageGenerationRequest {
    /// Request a single image.
    pub fn single(
        model: impl Into<String>,
        prompt: impl Into<String>,
        size: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            n: 1,
            size: size.into(),
            quality: quality.into(),
        }
    }
}

/// One generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ImageData {
    /// Hosted image location
    #[serde(default)]
    url: Option<String>,
    /// Inline PNG data
    #[serde(default)]
    b64_json: Option<String>,
    /// Prompt after provider-side rewriting
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// Image generation response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ImageGenerationResponse {
    /// Generated images
    #[serde(default)]
    data: Vec<ImageData>,
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) error: ApiErrorDetail,
}

/// Error details inside [`ApiErrorBody`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub(crate) message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_format_serialization() {
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat::new_strict("book_metadata", json!({"type": "object"})),
        };
        let value = serde_json::to_value(&format).unwrap();
        assert_eq!(value["type"], "json_schema");
        assert_eq!(value["json_schema"]["name"], "book_metadata");
        assert_eq!(value["json_schema"]["strict"], true);
    }

    #[test]
    fn test_request_skips_unset_options() {
        let request = ChatCompletionRequest::builder()
            .model("gpt-4o-mini")
            .messages(vec![ChatMessage::new(Role::User, "Hello")])
            .build()
            .unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"title\": \"Tilly\"}", "refusal": null},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.choices().len(), 1);
        assert_eq!(
            response.choices()[0].message().content().as_deref(),
            Some("{\"title\": \"Tilly\"}")
        );
        assert_eq!(response.usage().map(|u| *u.completion_tokens()), Some(8));
    }

    #[test]
    fn test_parse_image_response() {
        let body = r#"{
            "created": 1700000000,
            "data": [{"url": "https://example.com/a.png", "revised_prompt": "A turtle"}]
        }"#;
        let response: ImageGenerationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data()[0].url().as_deref(), Some("https://example.com/a.png"));
        assert!(response.data()[0].b64_json().is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Incorrect API key provided");
    }
}
