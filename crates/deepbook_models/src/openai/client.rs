//! OpenAI API client.

use super::conversion::{self, Defaults, ImageDefaults};
use super::dto::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ImageGenerationResponse};
use async_trait::async_trait;
use deepbook_core::{
    GenerateRequest, GenerateResponse, ImageQuality, ImageRequest, ImageResponse, ImageSize,
    ProviderConfig, SchemaDescriptor,
};
use deepbook_error::{DeepbookResult, HttpError, ProviderError, ProviderErrorKind};
use deepbook_interface::{DeepbookDriver, ImageGeneration, StructuredGeneration};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for OpenAI-compatible chat completion and image endpoints.
///
/// Implements all three collaborator traits, so a single client can back
/// every stage of a story run.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
    image_size: ImageSize,
    image_quality: ImageQuality,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No API key is configured or present in the environment
    /// - The HTTP client cannot be initialized
    #[instrument(skip_all, fields(model = %config.model, base_url = %config.base_url))]
    pub fn from_config(config: &ProviderConfig) -> DeepbookResult<Self> {
        let api_key = config.resolve_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size,
            image_quality: config.image_quality,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn defaults(&self) -> Defaults<'_> {
        Defaults {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn image_defaults(&self) -> ImageDefaults<'_> {
        ImageDefaults {
            model: &self.image_model,
            size: self.image_size,
            quality: self.image_quality,
        }
    }

    /// POST a JSON body and decode a JSON reply, classifying failures.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> DeepbookResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Sending OpenAI API request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or(error_text);
            warn!(status = status.as_u16(), message = %message, "OpenAI API returned an error");
            return Err(
                ProviderError::new(ProviderErrorKind::from_status(status.as_u16(), message)).into(),
            );
        }

        response.json::<R>().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
                "Failed to parse response: {}",
                e
            )))
            .into()
        })
    }

    async fn chat(&self, request: &ChatCompletionRequest) -> DeepbookResult<ChatCompletionResponse> {
        let response: ChatCompletionResponse = self.post_json("chat/completions", request).await?;
        if let Some(usage) = response.usage() {
            debug!(
                prompt_tokens = usage.prompt_tokens(),
                completion_tokens = usage.completion_tokens(),
                "OpenAI usage"
            );
        }
        Ok(response)
    }
}

fn classify_transport_error(e: reqwest::Error) -> deepbook_error::DeepbookError {
    let kind = if e.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Network(e.to_string())
    };
    ProviderError::new(kind).into()
}

#[async_trait]
impl DeepbookDriver for OpenAIClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> DeepbookResult<GenerateResponse> {
        let request = conversion::to_chat_request(req, self.defaults(), None)?;
        let response = self.chat(&request).await?;
        conversion::from_chat_response(&response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl StructuredGeneration for OpenAIClient {
    #[instrument(skip(self, prompt, schema), fields(model = %self.model, schema = %schema.name()))]
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> DeepbookResult<Value> {
        let req = GenerateRequest::from_prompt(prompt);
        let request =
            conversion::to_chat_request(&req, self.defaults(), Some(conversion::schema_format(schema)))?;
        let response = self.chat(&request).await?;
        let text = conversion::first_choice_text(&response)?;

        serde_json::from_str(&text).map_err(|e| {
            ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
                "Structured output was not valid JSON: {}",
                e
            )))
            .into()
        })
    }
}

#[async_trait]
impl ImageGeneration for OpenAIClient {
    #[instrument(skip(self, req), fields(model = %self.image_model))]
    async fn generate_image(&self, req: &ImageRequest) -> DeepbookResult<ImageResponse> {
        let body = conversion::to_image_request(req, self.image_defaults());
        let response: ImageGenerationResponse = self.post_json("images/generations", &body).await?;
        conversion::from_image_response(response)
    }

    fn image_model_name(&self) -> &str {
        &self.image_model
    }
}
