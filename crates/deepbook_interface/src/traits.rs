//! Trait definitions for language and image backends.

use async_trait::async_trait;
use deepbook_core::{GenerateRequest, GenerateResponse, ImageRequest, ImageResponse, SchemaDescriptor};
use deepbook_error::DeepbookResult;
use serde_json::Value;

/// Core trait that every language backend implements.
#[async_trait]
pub trait DeepbookDriver: Send + Sync {
    /// Generate model output for a request.
    async fn generate(&self, req: &GenerateRequest) -> DeepbookResult<GenerateResponse>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

/// Backends that can answer with JSON conforming to a schema.
///
/// The returned value is the raw object the model produced. Callers still
/// run [`SchemaDescriptor::validate`] on it before trusting its contents.
#[async_trait]
pub trait StructuredGeneration: DeepbookDriver {
    /// Generate a JSON value shaped by `schema`.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> DeepbookResult<Value>;
}

/// Backends that turn a text prompt into an image.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Generate one image.
    async fn generate_image(&self, req: &ImageRequest) -> DeepbookResult<ImageResponse>;

    /// Image model identifier (e.g., "dall-e-3").
    fn image_model_name(&self) -> &str;
}
