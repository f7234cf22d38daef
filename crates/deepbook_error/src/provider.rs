//! Language and image provider errors.

/// Specific provider failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Connection could not be established or was dropped
    #[display("Network failure: {}", _0)]
    Network(String),
    /// Credentials were rejected
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
    /// Provider asked us to slow down
    #[display("Rate limited by provider")]
    RateLimited,
    /// Request exceeded the configured timeout
    #[display("Request timed out")]
    Timeout,
    /// Provider returned a non-success status
    #[display("API error ({}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or provider message
        message: String,
    },
    /// Response body could not be understood
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
    /// Response contained no usable content
    #[display("Provider returned an empty response")]
    EmptyResponse,
    /// No API key was configured
    #[display("No API key configured (set {} or provider.api_key)", _0)]
    MissingCredentials(String),
}

impl ProviderErrorKind {
    /// Classify an HTTP status code returned by a provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepbook_error::ProviderErrorKind;
    ///
    /// assert_eq!(ProviderErrorKind::from_status(429, "slow down"), ProviderErrorKind::RateLimited);
    /// assert!(matches!(
    ///     ProviderErrorKind::from_status(401, "bad key"),
    ///     ProviderErrorKind::Authentication(_)
    /// ));
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Authentication(message.into()),
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }
}

/// Provider error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The specific error condition
    pub kind: ProviderErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
