//! Errors that carry only a message: transport, serialization and
//! configuration failures surfaced from third-party crates.

/// Declare a message error with a `#[track_caller]` constructor.
macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident, $display:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
        #[display($display, message, line, file)]
        pub struct $name {
            /// What went wrong
            pub message: String,
            /// Line number where the error was raised
            pub line: u32,
            /// File where the error was raised
            pub file: &'static str,
        }

        impl $name {
            /// Create the error at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }
    };
}

message_error!(
    /// The HTTP client could not be built or a request could not be sent.
    ///
    /// Status-level provider failures are [`crate::ProviderError`]s instead.
    ///
    /// ```
    /// use deepbook_error::HttpError;
    ///
    /// let err = HttpError::new("Connection refused");
    /// assert!(err.to_string().starts_with("HTTP Error: Connection refused"));
    /// ```
    HttpError,
    "HTTP Error: {} at line {} in {}"
);

message_error!(
    /// A value could not be serialized, or validated output did not fit its
    /// target type.
    JsonError,
    "JSON Error: {} at line {} in {}"
);

message_error!(
    /// Configuration sources could not be read or merged.
    ///
    /// ```
    /// use deepbook_error::ConfigError;
    ///
    /// let err = ConfigError::new("story.max_concurrency: invalid type");
    /// assert!(err.message.contains("max_concurrency"));
    /// ```
    ConfigError,
    "Configuration Error: {} at line {} in {}"
);
