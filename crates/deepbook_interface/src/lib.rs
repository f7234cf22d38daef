//! Trait definitions for the providers DeepBook drives.
//!
//! The story pipeline never talks to an API directly. It is generic over
//! these traits, so tests can substitute scripted drivers and deployments
//! can pick any provider that implements them.
//!
//! - [`DeepbookDriver`] - plain chat-style text generation
//! - [`StructuredGeneration`] - text generation constrained to a schema
//! - [`ImageGeneration`] - picture generation from a text prompt

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{DeepbookDriver, ImageGeneration, StructuredGeneration};
