//! Error types for the DeepBook storybook generator.
//!
//! Every crate in the workspace reports failures through the types defined here.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind with the source location that raised it
//! - constructors use `#[track_caller]` so the location is captured automatically
//!
//! The taxonomy maps onto the generation pipeline:
//! - [`SchemaValidationError`] - model output did not match the stage schema
//! - [`ProviderError`] - the language or image model call itself failed
//! - [`PromptError`] - a prompt template was rendered without required context
//! - [`StoryError`] - the pipeline was driven out of order or output could not be extracted
//!
//! # Examples
//!
//! ```
//! use deepbook_error::{DeepbookResult, ProviderError, ProviderErrorKind};
//!
//! fn call_model() -> DeepbookResult<String> {
//!     Err(ProviderError::new(ProviderErrorKind::RateLimited))?
//! }
//!
//! match call_model() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod error;
mod message;
mod prompt;
mod provider;
mod schema;
mod story;

pub use builder::{BuilderError, BuilderErrorKind};
pub use error::{DeepbookError, DeepbookErrorKind, DeepbookResult};
pub use message::{ConfigError, HttpError, JsonError};
pub use prompt::{PromptError, PromptErrorKind};
pub use provider::{ProviderError, ProviderErrorKind};
pub use schema::{SchemaValidationError, SchemaViolation};
pub use story::{StoryError, StoryErrorKind};
