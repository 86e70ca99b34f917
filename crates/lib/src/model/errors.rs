//! Validation errors for board payloads.

use thiserror::Error;

/// Errors raised when a payload fails boundary validation.
///
/// Every payload entering a [`crate::view::BoardView`] or the
/// [`crate::service::BoardService`] is checked before any mutation, so these
/// errors never leave partially applied state behind.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// An identifier could not be parsed.
    #[error("Invalid {kind}: {value}")]
    InvalidId { kind: &'static str, value: String },

    /// A title was empty after trimming.
    #[error("{field} is required")]
    EmptyTitle { field: &'static str },

    /// A title exceeded the maximum length.
    #[error("{field} must be under {max} characters")]
    TitleTooLong { field: &'static str, max: usize },

    /// A position was NaN or infinite.
    #[error("Position must be a finite number, got {value}")]
    NonFinitePosition { value: f64 },

    /// A task nested under a list declares a different list id.
    #[error("Task '{task_id}' declares list '{declared}' but was found under '{container}'")]
    ListMismatch {
        task_id: String,
        declared: String,
        container: String,
    },

    /// The same id appears twice in one payload.
    #[error("Duplicate {kind} id in payload: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

impl From<ModelError> for crate::Error {
    fn from(err: ModelError) -> Self {
        crate::Error::Model(err)
    }
}
