//! Request and response types for image generation.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// Output dimensions accepted by image models.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ImageSize {
    /// 1024 x 1024
    #[default]
    #[serde(rename = "1024x1024")]
    #[strum(serialize = "1024x1024")]
    Square,
    /// 1792 x 1024
    #[serde(rename = "1792x1024")]
    #[strum(serialize = "1792x1024")]
    Landscape,
    /// 1024 x 1792
    #[serde(rename = "1024x1792")]
    #[strum(serialize = "1024x1792")]
    Portrait,
}

/// Rendering quality for image models.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageQuality {
    /// Faster, cheaper rendering
    Standard,
    /// Finer detail
    #[default]
    Hd,
}

/// Provider-neutral image generation request.
///
/// # Examples
///
/// ```
/// use deepbook_core::{ImageQuality, ImageRequest, ImageSize};
///
/// let request = ImageRequest::builder()
///     .prompt("A children's book illustration of a shy turtle.")
///     .build()
///     .unwrap();
///
/// assert!(request.model().is_none());
/// assert!(request.size().is_none());
///
/// let landscape = ImageRequest::builder()
///     .prompt("A forest clearing at dawn.")
///     .size(ImageSize::Landscape)
///     .quality(ImageQuality::Standard)
///     .build()
///     .unwrap();
/// assert_eq!(*landscape.size(), Some(ImageSize::Landscape));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ImageRequest {
    /// Text description of the picture
    prompt: String,
    /// Model identifier override
    #[builder(default)]
    model: Option<String>,
    /// Output dimensions; the provider's configured size when unset
    #[builder(default, setter(into, strip_option))]
    size: Option<ImageSize>,
    /// Rendering quality; the provider's configured quality when unset
    #[builder(default, setter(into, strip_option))]
    quality: Option<ImageQuality>,
}

impl ImageRequest {
    /// Creates a new builder for `ImageRequest`.
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }
}

/// A generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ImageResponse {
    /// Image payload
    image: MediaSource,
    /// Prompt the provider actually rendered, when it rewrote ours
    revised_prompt: Option<String>,
}

impl ImageResponse {
    /// Wrap an image payload.
    pub fn new(image: MediaSource, revised_prompt: Option<String>) -> Self {
        Self {
            image,
            revised_prompt,
        }
    }

    /// Consume the response, keeping only the image.
    pub fn into_image(self) -> MediaSource {
        self.image
    }
}
