//! Type conversions between DeepBook and OpenAI types.

use super::dto::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ImageGenerationRequest,
    ImageGenerationResponse, JsonSchemaFormat, ResponseFormat,
};
use deepbook_core::{
    GenerateRequest, GenerateResponse, ImageQuality, ImageRequest, ImageResponse, ImageSize,
    MediaSource, Output, SchemaDescriptor,
};
use deepbook_error::{BuilderError, DeepbookResult, ProviderError, ProviderErrorKind};

/// Defaults applied when a request leaves a knob unset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Defaults<'a> {
    pub(crate) model: &'a str,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f32,
}

/// Converts a DeepBook request to a chat completion request.
pub(crate) fn to_chat_request(
    request: &GenerateRequest,
    defaults: Defaults<'_>,
    response_format: Option<ResponseFormat>,
) -> DeepbookResult<ChatCompletionRequest> {
    let messages = request
        .messages()
        .iter()
        .map(|m| ChatMessage::new(*m.role(), m.content().clone()))
        .collect::<Vec<_>>();

    ChatCompletionRequest::builder()
        .model(request.model().clone().unwrap_or_else(|| defaults.model.to_string()))
        .messages(messages)
        .max_tokens(Some(request.max_tokens().unwrap_or(defaults.max_tokens)))
        .temperature(Some(request.temperature().unwrap_or(defaults.temperature)))
        .response_format(response_format)
        .build()
        .map_err(|e| BuilderError::from_builder("ChatCompletionRequest", e).into())
}

/// Strict JSON Schema response format for a descriptor.
pub(crate) fn schema_format(schema: &SchemaDescriptor) -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat::new_strict(schema.name().clone(), schema.to_json_schema()),
    }
}

/// Text of the first choice.
///
/// A refusal or a missing body is reported as a provider failure.
pub(crate) fn first_choice_text(response: &ChatCompletionResponse) -> DeepbookResult<String> {
    let choice = response
        .choices()
        .first()
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyResponse))?;

    if let Some(refusal) = choice.message().refusal() {
        return Err(ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
            "model refused: {}",
            refusal
        )))
        .into());
    }

    match choice.message().content() {
        Some(text) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(ProviderError::new(ProviderErrorKind::EmptyResponse).into()),
    }
}

/// Converts a chat completion response to a DeepBook response.
pub(crate) fn from_chat_response(
    response: &ChatCompletionResponse,
) -> DeepbookResult<GenerateResponse> {
    let text = first_choice_text(response)?;
    Ok(GenerateResponse::new(vec![Output::Text(text)]))
}

/// Defaults applied when an image request leaves a knob unset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageDefaults<'a> {
    pub(crate) model: &'a str,
    pub(crate) size: ImageSize,
    pub(crate) quality: ImageQuality,
}

/// Converts a DeepBook image request to an image generation request.
pub(crate) fn to_image_request(
    request: &ImageRequest,
    defaults: ImageDefaults<'_>,
) -> ImageGenerationRequest {
    ImageGenerationRequest::single(
        request.model().clone().unwrap_or_else(|| defaults.model.to_string()),
        request.prompt().clone(),
        request.size().unwrap_or(defaults.size).to_string(),
        request.quality().unwrap_or(defaults.quality).to_string(),
    )
}

/// Converts an image generation response to a DeepBook image response.
pub(crate) fn from_image_response(response: ImageGenerationResponse) -> DeepbookResult<ImageResponse> {
    let data = response
        .data()
        .first()
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyResponse))?;

    let image = match (data.url(), data.b64_json()) {
        (Some(url), _) => MediaSource::Url(url.clone()),
        (None, Some(b64)) => MediaSource::Base64(b64.clone()),
        (None, None) => {
            return Err(ProviderError::new(ProviderErrorKind::MalformedResponse(
                "image response carried neither url nor b64_json".to_string(),
            ))
            .into());
        }
    };

    Ok(ImageResponse::new(image, data.revised_prompt().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepbook_core::{FieldSpec, Message};

    const DEFAULTS: Defaults<'static> = Defaults {
        model: "gpt-4o-mini",
        max_tokens: 2048,
        temperature: 0.7,
    };

    #[test]
    fn test_request_defaults_applied() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::system("Be brief."), Message::user("Hi")])
            .temperature(Some(0.2))
            .build()
            .unwrap();
        let chat = to_chat_request(&request, DEFAULTS, None).unwrap();

        assert_eq!(chat.model(), "gpt-4o-mini");
        assert_eq!(*chat.max_tokens(), Some(2048));
        assert_eq!(*chat.temperature(), Some(0.2));
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn test_schema_format_uses_descriptor_name() {
        let schema = SchemaDescriptor::new("book_metadata").field(FieldSpec::text("title"));
        match schema_format(&schema) {
            ResponseFormat::JsonSchema { json_schema } => {
                assert_eq!(json_schema.name(), "book_metadata");
                assert!(*json_schema.strict());
            }
            other => panic!("unexpected format: {:?}", other),
        }
    }

    #[test]
    fn test_refusal_is_error() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": null, "refusal": "I can't help with that."}}]}"#,
        )
        .unwrap();
        assert!(first_choice_text(&response).is_err());
    }

    #[test]
    fn test_empty_choices_is_error() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = first_choice_text(&response).unwrap_err();
        assert!(matches!(
            err.as_provider().map(|e| &e.kind),
            Some(ProviderErrorKind::EmptyResponse)
        ));
    }

    const IMAGE_DEFAULTS: ImageDefaults<'static> = ImageDefaults {
        model: "dall-e-3",
        size: ImageSize::Square,
        quality: ImageQuality::Hd,
    };

    #[test]
    fn test_image_request_overrides() {
        let request = ImageRequest::builder()
            .prompt("A turtle")
            .size(ImageSize::Portrait)
            .quality(ImageQuality::Standard)
            .build()
            .unwrap();
        let body = to_image_request(&request, IMAGE_DEFAULTS);
        assert_eq!(body.model(), "dall-e-3");
        assert_eq!(body.size(), "1024x1792");
        assert_eq!(body.quality(), "standard");
        assert_eq!(*body.n(), 1);
    }

    #[test]
    fn test_image_request_defaults() {
        let request = ImageRequest::builder().prompt("A turtle").build().unwrap();
        let body = to_image_request(&request, IMAGE_DEFAULTS);
        assert_eq!(body.size(), "1024x1024");
        assert_eq!(body.quality(), "hd");
    }

    #[test]
    fn test_base64_image_response() {
        let response: ImageGenerationResponse =
            serde_json::from_str(r#"{"data": [{"b64_json": "iVBORw0KGgo"}]}"#).unwrap();
        let image = from_image_response(response).unwrap();
        assert_eq!(*image.image(), MediaSource::Base64("iVBORw0KGgo".to_string()));
    }
}
