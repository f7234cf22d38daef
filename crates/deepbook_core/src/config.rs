//! Layered configuration for providers and story generation.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`deepbook.toml` shipped with the library)
//! 2. `~/.config/deepbook/deepbook.toml`
//! 3. `./deepbook.toml`
//! 4. Environment variables such as `DEEPBOOK__PROVIDER__MODEL`
//!
//! The resulting [`DeepbookConfig`] is handed explicitly to the provider
//! client and to the story pipeline. Nothing here is global.

use crate::{ImageQuality, ImageSize};
use deepbook_error::{
    ConfigError, DeepbookError, DeepbookResult, ProviderError, ProviderErrorKind,
};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../deepbook.toml");

/// Environment variable prefix and nesting separator.
const ENV_PREFIX: &str = "DEEPBOOK";
const ENV_SEPARATOR: &str = "__";

/// Credentials and model selection for the language and image provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Chat model used for every text stage
    pub model: String,
    /// Image model used for illustrations
    pub image_model: String,
    /// Illustration dimensions
    pub image_size: ImageSize,
    /// Illustration quality
    pub image_quality: ImageQuality,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap per call
    pub max_tokens: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Inline API key; prefer `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable read when `api_key` is unset
    pub api_key_env: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: ImageSize::Square,
            image_quality: ImageQuality::Hd,
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 120,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl ProviderConfig {
    /// The API key, from the config itself or from `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::MissingCredentials`] if neither source
    /// yields a non-empty key.
    pub fn resolve_api_key(&self) -> DeepbookResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::MissingCredentials(
                    self.api_key_env.clone(),
                ))
                .into()
            })
    }
}

/// What to do when the model names two characters the same.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DuplicateCharacterPolicy {
    /// Keep the first occurrence, drop later ones
    #[default]
    Dedupe,
    /// Fail the characters stage
    Reject,
}

/// What to do when the outline length differs from `chapter_count`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutlineLengthPolicy {
    /// Keep the first `chapter_count` entries; accept shorter outlines
    #[default]
    Truncate,
    /// Fail the outline stage on any mismatch
    Strict,
    /// Ignore the requested count
    Accept,
}

/// Story shape and pipeline behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Requested number of chapters
    pub chapter_count: Option<usize>,
    /// Upper bound on concurrent calls within a fan-out stage
    pub max_concurrency: usize,
    /// Whether to run the illustrations stage
    pub illustrations: bool,
    /// Duplicate character name handling
    pub duplicate_characters: DuplicateCharacterPolicy,
    /// Outline length handling
    pub outline_length: OutlineLengthPolicy,
    /// Style descriptors prepended to every image prompt
    pub illustration_style: Vec<String>,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            chapter_count: Some(5),
            max_concurrency: 4,
            illustrations: true,
            duplicate_characters: DuplicateCharacterPolicy::default(),
            outline_length: OutlineLengthPolicy::default(),
            illustration_style: [
                "whimsical",
                "colorful",
                "watercolor style",
                "children's book illustration",
                "cute and friendly",
                "detailed background",
                "gentle color palette",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl StoryConfig {
    /// Fan-out worker bound, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }

    /// Style descriptors joined for an image prompt.
    pub fn style_text(&self) -> String {
        self.illustration_style.join(", ")
    }
}

/// Complete DeepBook configuration.
///
/// # Example
///
/// ```no_run
/// use deepbook_core::DeepbookConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DeepbookConfig::load()?;
/// println!("Writing with {}", config.provider.model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DeepbookConfig {
    /// Provider settings
    pub provider: ProviderConfig,
    /// Story settings
    pub story: StoryConfig,
}

impl DeepbookConfig {
    /// Load configuration with precedence:
    /// environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if absent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a present file cannot be parsed or a
    /// value has the wrong type.
    #[instrument]
    pub fn load() -> DeepbookResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder = Self::bundled_builder();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/deepbook/deepbook.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("deepbook").required(false))
            .add_source(Self::environment());

        Self::finish(builder)
    }

    /// Load a single explicit file on top of the bundled defaults.
    ///
    /// Environment variables still take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DeepbookResult<Self> {
        debug!("Loading configuration from file");

        let builder = Self::bundled_builder()
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Self::environment());

        Self::finish(builder)
    }

    /// Bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bundled file is malformed.
    pub fn bundled() -> DeepbookResult<Self> {
        Self::finish(Self::bundled_builder())
    }

    fn bundled_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> DeepbookResult<Self> {
        builder
            .build()
            .map_err(|e| {
                DeepbookError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                DeepbookError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}
