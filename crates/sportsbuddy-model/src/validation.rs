use thiserror::Error;

/// Validation errors for model primitives.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// When a value does not match the required pattern.
    #[error("{field} ('{value}') is not allowed")]
    PatternMismatch {
        /// Field name that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// When a required value is empty or whitespace.
    #[error("{field} must not be blank")]
    Blank {
        /// Field name that was blank.
        field: &'static str,
    },
}

/// Returns true if the string is empty after trimming.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
