use crate::expression::ExpressionError;
use thiserror::Error;

/// Error types for the datareduce-rs library.
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// A name or key was looked up and is not present.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entry with the same name already exists.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// An index or argument is outside its valid range.
    #[error("Index out of range: {0}")]
    OutOfRange(String),

    /// A malformed name or argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not supported by this object.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An execution precondition failed.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A property direction outside Input=0, Output=1, InOut=2.
    #[error("Invalid property direction: {0}")]
    InvalidDirection(i32),

    /// A property rejected a value or failed validation.
    #[error("Invalid property '{name}': {message}")]
    InvalidProperty { name: String, message: String },

    /// A stored object does not have the requested type.
    #[error("Type mismatch for '{name}': expected {expected}")]
    TypeMismatch { name: String, expected: String },

    /// The running algorithm observed its cancellation flag.
    #[error("Algorithm '{0}' was cancelled")]
    Cancelled(String),

    /// Error parsing or evaluating a tie expression.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

impl FrameworkError {
    /// Whether a child algorithm may swallow this error after logging it.
    ///
    /// Cancellation always reaches the top-level caller.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FrameworkError::Cancelled(_))
    }
}

/// Result type alias for datareduce-rs operations.
pub type Result<T> = std::result::Result<T, FrameworkError>;

impl From<String> for FrameworkError {
    fn from(s: String) -> Self {
        FrameworkError::Other(s)
    }
}

impl From<&str> for FrameworkError {
    fn from(s: &str) -> Self {
        FrameworkError::Other(s.to_string())
    }
}
