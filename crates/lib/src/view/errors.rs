//! Error types for the client-side board view.

use thiserror::Error;

use crate::model::{ListId, TaskId};

/// Errors raised by [`super::BoardView`] mutations.
///
/// A failed mutation never changes the view.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// The referenced list is not part of this view.
    #[error("List not found in view: {list_id}")]
    UnknownList { list_id: ListId },

    /// The referenced task is not part of this view.
    #[error("Task not found in view: {task_id}")]
    UnknownTask { task_id: TaskId },

    /// The task exists but not in the list the caller named.
    #[error("Task '{task_id}' is not in list '{list_id}'")]
    TaskNotInList { task_id: TaskId, list_id: ListId },
}

impl ViewError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ViewError::UnknownList { .. } | ViewError::UnknownTask { .. }
        )
    }
}

impl From<ViewError> for crate::Error {
    fn from(err: ViewError) -> Self {
        crate::Error::View(err)
    }
}
