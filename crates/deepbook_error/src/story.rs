//! Story pipeline error types.

/// Specific story pipeline failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoryErrorKind {
    /// A stage ran before the stage whose output it needs
    #[display("Stage '{}' requires '{}' to have completed", stage, requires)]
    MissingPrerequisite {
        /// Stage that was attempted
        stage: String,
        /// Stage output that was absent
        requires: String,
    },
    /// Model response contained no JSON document
    #[display("No JSON found in model response (length: {})", _0)]
    NoJsonFound(usize),
    /// Extracted JSON could not be parsed
    #[display("Failed to parse extracted JSON: {}", _0)]
    Extraction(String),
}

/// Error type for story pipeline operations.
///
/// # Examples
///
/// ```
/// use deepbook_error::{StoryError, StoryErrorKind};
///
/// let err = StoryError::new(StoryErrorKind::NoJsonFound(42));
/// assert!(format!("{}", err).contains("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Story Error: {} at line {} in {}", kind, line, file)]
pub struct StoryError {
    /// The specific error condition
    pub kind: StoryErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoryError {
    /// Create a new StoryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
