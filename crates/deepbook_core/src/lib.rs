//! Core data types for the DeepBook storybook generator.
//!
//! This crate provides the provider-neutral vocabulary shared by every other
//! crate: chat-style generation requests, image requests, the schema engine
//! that checks structured model output, and the layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod image;
mod media;
mod message;
mod output;
mod request;
mod role;
mod schema;

pub use config::{
    DeepbookConfig, DuplicateCharacterPolicy, OutlineLengthPolicy, ProviderConfig, StoryConfig,
};
pub use image::{ImageQuality, ImageRequest, ImageRequestBuilder, ImageResponse, ImageSize};
pub use media::MediaSource;
pub use message::{Message, MessageBuilder};
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
pub use schema::{Constraint, FieldSpec, FieldType, SchemaDescriptor};
