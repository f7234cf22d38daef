//! Structured generation for drivers without native schema support.

use crate::{extract_json, parse_json};
use async_trait::async_trait;
use deepbook_core::{GenerateRequest, GenerateResponse, SchemaDescriptor};
use deepbook_error::DeepbookResult;
use deepbook_interface::{DeepbookDriver, StructuredGeneration};
use serde_json::Value;
use tracing::{debug, instrument};

/// Adapts any [`DeepbookDriver`] into a [`StructuredGeneration`] backend.
///
/// The schema's format instructions are appended to the prompt and the JSON
/// document is recovered from the free-text reply with [`extract_json`].
///
/// # Example
///
/// ```rust,ignore
/// use deepbook_story::{PromptedJson, StoryPipeline};
///
/// let llm = PromptedJson::new(local_driver);
/// let pipeline = StoryPipeline::new(llm, image_client, config.story);
/// ```
#[derive(Debug, Clone)]
pub struct PromptedJson<D> {
    driver: D,
}

impl<D: DeepbookDriver> PromptedJson<D> {
    /// Wrap a driver.
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Unwrap the driver.
    pub fn into_inner(self) -> D {
        self.driver
    }
}

#[async_trait]
impl<D: DeepbookDriver> DeepbookDriver for PromptedJson<D> {
    async fn generate(&self, req: &GenerateRequest) -> DeepbookResult<GenerateResponse> {
        self.driver.generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        self.driver.provider_name()
    }

    fn model_name(&self) -> &str {
        self.driver.model_name()
    }
}

#[async_trait]
impl<D: DeepbookDriver> StructuredGeneration for PromptedJson<D> {
    #[instrument(skip(self, prompt, schema), fields(provider = self.driver.provider_name(), schema = %schema.name()))]
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> DeepbookResult<Value> {
        let full_prompt = format!("{}\n\n{}", prompt, schema.format_instructions());
        let response = self
            .driver
            .generate(&GenerateRequest::from_prompt(full_prompt))
            .await?;
        let text = response.text()?;
        debug!(response_length = text.len(), "Extracting JSON from response");

        let json = extract_json(&text)?;
        parse_json(&json)
    }
}
