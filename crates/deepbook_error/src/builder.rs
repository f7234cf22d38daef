//! Errors raised while assembling request and data types with their builders.

/// Why a builder refused to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A field without a default was never set
    #[display("{} is missing required field '{}'", target, field)]
    Uninitialized {
        /// Type being built
        target: &'static str,
        /// Unset field
        field: String,
    },
    /// The builder rejected the values it was given
    #[display("{} could not be built: {}", target, reason)]
    Invalid {
        /// Type being built
        target: &'static str,
        /// Builder message
        reason: String,
    },
}

/// Builder failure with the location that attempted the build.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify a derived builder's error message for `target`.
    ///
    /// Derived builders report unset fields as "`field` must be initialized";
    /// any other message is kept as the reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepbook_error::{BuilderError, BuilderErrorKind};
    ///
    /// let err = BuilderError::from_builder("ImageRequest", "`prompt` must be initialized");
    /// assert_eq!(
    ///     err.kind(),
    ///     &BuilderErrorKind::Uninitialized { target: "ImageRequest", field: "prompt".to_string() }
    /// );
    /// ```
    #[track_caller]
    pub fn from_builder(target: &'static str, message: impl std::fmt::Display) -> Self {
        let message = message.to_string();
        let field = message
            .strip_suffix(" must be initialized")
            .map(|f| f.trim_matches('`').to_string());
        Self::new(match field {
            Some(field) => BuilderErrorKind::Uninitialized { target, field },
            None => BuilderErrorKind::Invalid {
                target,
                reason: message,
            },
        })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
