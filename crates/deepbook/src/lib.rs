//! DeepBook - illustrated children's storybooks from a single prompt.
//!
//! A story is generated in five stages, each feeding its validated output to
//! the next: title page, cast, character portraits, outline and chapter text.
//! The result is a [`Book`] that can be rendered as markdown or serialized
//! as JSON.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deepbook::{DeepbookConfig, OpenAIClient, StoryPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeepbookConfig::load()?;
//!     let client = OpenAIClient::from_config(&config.provider)?;
//!     let pipeline = StoryPipeline::new(client.clone(), client, config.story);
//!
//!     let run = pipeline.run("A turtle who helps his forest friends").await;
//!     println!("{}", run.book().to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `deepbook_error` - Error types
//! - `deepbook_core` - Request, image and schema types, configuration
//! - `deepbook_interface` - Language and image model traits
//! - `deepbook_models` - OpenAI-compatible provider
//! - `deepbook_story` - Book model, prompts, stages and pipeline
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;

pub use observability::{LogFormat, init_logging};

// Re-export error types
pub use deepbook_error::{
    BuilderError, BuilderErrorKind, ConfigError, DeepbookError, DeepbookErrorKind,
    DeepbookResult, HttpError, JsonError, PromptError, PromptErrorKind, ProviderError,
    ProviderErrorKind, SchemaValidationError, SchemaViolation, StoryError, StoryErrorKind,
};

// Re-export core types
pub use deepbook_core::{
    Constraint, DeepbookConfig, DuplicateCharacterPolicy, FieldSpec, FieldType,
    GenerateRequest, GenerateResponse, ImageQuality, ImageRequest, ImageResponse, ImageSize,
    MediaSource, Message, OutlineLengthPolicy, Output, ProviderConfig, Role, SchemaDescriptor,
    StoryConfig,
};

// Re-export traits
pub use deepbook_interface::{DeepbookDriver, ImageGeneration, StructuredGeneration};

// Re-export the provider
pub use deepbook_models::OpenAIClient;

// Re-export the story pipeline
pub use deepbook_story::{
    Book, BookMetadata, BookOutline, Chapter, ChapterOutline, Character, IncompleteItem,
    Illustration, PartialCompletionWarning, PipelineState, PromptedJson, Stage, StoryPipeline,
    StoryRun, StorySnapshot,
};
