//! Error types for the authoritative board service.

use thiserror::Error;

use crate::model::{BoardId, ListId, TaskId, UserId};

/// Errors raised by [`super::BoardService`] operations.
///
/// Every check runs before the store is written, so a failed operation leaves
/// no partial state behind.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Board not found: {board_id}")]
    BoardNotFound { board_id: BoardId },

    #[error("List not found: {list_id}")]
    ListNotFound { list_id: ListId },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: TaskId },

    #[error("User '{user_id}' is not a member of board '{board_id}'")]
    MemberNotFound { board_id: BoardId, user_id: UserId },

    /// The acting user does not belong to the board.
    #[error("Access denied to board '{board_id}'")]
    NotAMember { board_id: BoardId, user_id: UserId },

    #[error("Only admins can {action} on board '{board_id}'")]
    AdminRequired {
        board_id: BoardId,
        action: &'static str,
    },

    #[error("Only the owner can delete board '{board_id}'")]
    OwnerRequired { board_id: BoardId },

    #[error("Admins cannot remove themselves")]
    CannotRemoveSelf,

    #[error("Cannot remove the board owner")]
    CannotRemoveOwner,

    #[error("User '{user_id}' is already a member")]
    AlreadyMember { user_id: UserId },

    /// Tasks may only move between lists of the same board.
    #[error("Cannot move task '{task_id}' to list '{list_id}' on another board")]
    CrossBoardMove { task_id: TaskId, list_id: ListId },

    #[error("Assignee '{user_id}' is not a member of the board")]
    UnknownAssignee { user_id: UserId },

    #[error("Update contains no changes")]
    EmptyUpdate,
}

impl ServiceError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::BoardNotFound { .. }
                | ServiceError::ListNotFound { .. }
                | ServiceError::TaskNotFound { .. }
                | ServiceError::MemberNotFound { .. }
        )
    }

    /// Check if this error means the acting user lacks the required role.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            ServiceError::NotAMember { .. }
                | ServiceError::AdminRequired { .. }
                | ServiceError::OwnerRequired { .. }
        )
    }

    /// Check if this error is a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::AlreadyMember { .. })
    }

    /// Check if this error is a rejected request shape.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ServiceError::CannotRemoveSelf
                | ServiceError::CannotRemoveOwner
                | ServiceError::CrossBoardMove { .. }
                | ServiceError::UnknownAssignee { .. }
                | ServiceError::EmptyUpdate
        )
    }
}

impl From<ServiceError> for crate::Error {
    fn from(err: ServiceError) -> Self {
        crate::Error::Service(err)
    }
}
