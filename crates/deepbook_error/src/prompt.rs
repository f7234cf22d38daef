//! Prompt rendering errors.

/// Specific prompt rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PromptErrorKind {
    /// A placeholder had no value in the supplied context
    #[display("Template '{}' requires context key '{}'", template, key)]
    MissingContext {
        /// Template name
        template: String,
        /// Missing context key
        key: String,
    },
    /// An optional section was opened but never closed
    #[display("Template '{}' has an unterminated section '{}'", template, key)]
    UnterminatedSection {
        /// Template name
        template: String,
        /// Section key
        key: String,
    },
}

/// Error type for prompt rendering.
///
/// # Examples
///
/// ```
/// use deepbook_error::{PromptError, PromptErrorKind};
///
/// let err = PromptError::new(PromptErrorKind::MissingContext {
///     template: "chapter_text".to_string(),
///     key: "characters".to_string(),
/// });
/// assert!(format!("{}", err).contains("characters"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Prompt Error: {} at line {} in {}", kind, line, file)]
pub struct PromptError {
    /// The specific error condition
    pub kind: PromptErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PromptError {
    /// Create a new PromptError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PromptErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
