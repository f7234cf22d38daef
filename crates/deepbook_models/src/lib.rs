//! Provider integrations for DeepBook.
//!
//! Each provider lives behind its own feature flag.
//!
//! # Available Providers
//!
//! - **OpenAI** (and any API speaking the same chat completions and image
//!   generation protocol) - Enable with `openai` feature
//!
//! # Example
//!
//! ```toml
//! [dependencies]
//! deepbook_models = { version = "0.1", features = ["openai"] }
//! ```
//!
//! ```no_run
//! # #[cfg(feature = "openai")]
//! # {
//! use deepbook_core::DeepbookConfig;
//! use deepbook_interface::DeepbookDriver;
//! use deepbook_core::GenerateRequest;
//! use deepbook_models::OpenAIClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeepbookConfig::load()?;
//! let client = OpenAIClient::from_config(&config.provider)?;
//! let response = client
//!     .generate(&GenerateRequest::from_prompt("Name a friendly turtle."))
//!     .await?;
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatMessage,
    ImageGenerationRequest, ImageGenerationResponse, JsonSchemaFormat, OpenAIClient,
    ResponseFormat,
};
