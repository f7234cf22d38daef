//! Schema validation error types.

/// The constraint a model output violated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SchemaViolation {
    /// A required field was absent or null
    #[display("required field is missing")]
    MissingField,
    /// A field held a value of the wrong primitive type
    #[display("expected {}", expected)]
    WrongType {
        /// Name of the expected type
        expected: &'static str,
    },
    /// A text field was empty after trimming
    #[display("text must not be empty")]
    EmptyText,
    /// An integer field was zero or negative
    #[display("integer must be positive")]
    NonPositive,
    /// A list had fewer items than required
    #[display("expected at least {} item(s)", min)]
    TooFewItems {
        /// Minimum item count
        min: usize,
    },
    /// A value that must be unique appeared more than once
    #[display("duplicate value '{}'", value)]
    Duplicate {
        /// The repeated value
        value: String,
    },
    /// An index sequence skipped or repeated a number
    #[display("expected index {} but found {}", expected, found)]
    NotSequential {
        /// Index expected at this position
        expected: i64,
        /// Index actually present
        found: i64,
    },
    /// A list length did not match the requested length
    #[display("expected {} item(s) but found {}", expected, found)]
    CountMismatch {
        /// Requested item count
        expected: usize,
        /// Item count returned
        found: usize,
    },
    /// A returned index does not match the index that was requested
    #[display("expected index {} but model returned {}", expected, found)]
    IndexMismatch {
        /// Requested index
        expected: i64,
        /// Index returned by the model
        found: i64,
    },
}

/// Model output that does not conform to a stage schema.
///
/// Carries the path of the offending field (for example `characters[2].name`)
/// and the constraint it broke.
///
/// # Examples
///
/// ```
/// use deepbook_error::{SchemaValidationError, SchemaViolation};
///
/// let err = SchemaValidationError::new("title", SchemaViolation::EmptyText);
/// assert_eq!(err.path, "title");
/// assert!(format!("{}", err).contains("must not be empty"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Schema Validation Error: field '{}' {} at line {} in {}", path, violation, line, file)]
pub struct SchemaValidationError {
    /// Path of the offending field
    pub path: String,
    /// The violated constraint
    pub violation: SchemaViolation,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SchemaValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(path: impl Into<String>, violation: SchemaViolation) -> Self {
        let location = std::panic::Location::caller();
        Self {
            path: path.into(),
            violation,
            line: location.line(),
            file: location.file(),
        }
    }
}
