//! OpenAI chat completions and image generation.

mod client;
mod conversion;
mod dto;

pub use client::OpenAIClient;
pub use dto::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatMessage,
    ImageGenerationRequest, ImageGenerationResponse, JsonSchemaFormat, ResponseFormat,
};
