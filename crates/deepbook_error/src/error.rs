//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, HttpError, JsonError, PromptError, ProviderError,
    SchemaValidationError, StoryError,
};

/// Every error condition the workspace can produce.
///
/// # Examples
///
/// ```
/// use deepbook_error::{DeepbookError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: DeepbookError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum DeepbookErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Stage output failed schema validation
    #[from(SchemaValidationError)]
    Schema(SchemaValidationError),
    /// Language or image provider failure
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Prompt rendering failure
    #[from(PromptError)]
    Prompt(PromptError),
    /// Pipeline sequencing or extraction failure
    #[from(StoryError)]
    Story(StoryError),
}

/// DeepBook error with kind discrimination.
///
/// # Examples
///
/// ```
/// use deepbook_error::{DeepbookError, DeepbookErrorKind, DeepbookResult, ConfigError};
///
/// fn might_fail() -> DeepbookResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), DeepbookErrorKind::Config(_)));
/// ```
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("DeepBook Error: {}", _0)]
pub struct DeepbookError(Box<DeepbookErrorKind>);

impl DeepbookError {
    /// Create a new error from a kind.
    pub fn new(kind: DeepbookErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DeepbookErrorKind {
        &self.0
    }

    /// Returns the schema violation if this error is a validation failure.
    pub fn as_schema(&self) -> Option<&SchemaValidationError> {
        match self.kind() {
            DeepbookErrorKind::Schema(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the provider failure if this error came from a model call.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            DeepbookErrorKind::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<T> for DeepbookError
where
    T: Into<DeepbookErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for DeepBook operations.
///
/// # Examples
///
/// ```
/// use deepbook_error::{DeepbookResult, HttpError};
///
/// fn fetch_data() -> DeepbookResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type DeepbookResult<T> = std::result::Result<T, DeepbookError>;
