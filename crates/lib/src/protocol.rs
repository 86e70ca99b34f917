//! Wire protocol shared by the server and its clients.
//!
//! Real-time events travel as `{"event": "<name>", "payload": ...}`. Every
//! entity-bearing event carries the complete entity so receivers can apply it
//! idempotently; deletions carry only the id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Board, BoardId, List, ListId, Member, Priority, Task, TaskId, UserId, validate_position,
    validate_title,
};

/// A change to one board, fanned out to everyone in the board's room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum BoardEvent {
    #[serde(rename = "list:created")]
    ListCreated(List),

    #[serde(rename = "list:updated")]
    ListUpdated(List),

    #[serde(rename = "list:deleted")]
    ListDeleted {
        #[serde(rename = "listId")]
        list_id: ListId,
    },

    #[serde(rename = "task:created")]
    TaskCreated(Task),

    #[serde(rename = "task:updated")]
    TaskUpdated(Task),

    #[serde(rename = "task:moved")]
    TaskMoved(Task),

    #[serde(rename = "task:deleted")]
    TaskDeleted {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },

    #[serde(rename = "member:added")]
    MemberAdded(Member),

    #[serde(rename = "member:removed")]
    MemberRemoved {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl BoardEvent {
    /// The event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::ListCreated(_) => "list:created",
            BoardEvent::ListUpdated(_) => "list:updated",
            BoardEvent::ListDeleted { .. } => "list:deleted",
            BoardEvent::TaskCreated(_) => "task:created",
            BoardEvent::TaskUpdated(_) => "task:updated",
            BoardEvent::TaskMoved(_) => "task:moved",
            BoardEvent::TaskDeleted { .. } => "task:deleted",
            BoardEvent::MemberAdded(_) => "member:added",
            BoardEvent::MemberRemoved { .. } => "member:removed",
        }
    }
}

/// Control messages a client sends over the websocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Subscribe to a board's room, leaving any previous one.
    JoinBoard {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
    /// Stop receiving events.
    LeaveBoard,
}

/// Frames the server sends over the websocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined {
        #[serde(rename = "boardId")]
        board_id: BoardId,
    },
    Event {
        #[serde(rename = "boardId")]
        board_id: BoardId,
        event: BoardEvent,
    },
    /// The server stopped forwarding a board's events: the user was removed
    /// from it or the board was deleted.
    Left {
        #[serde(rename = "boardId")]
        board_id: BoardId,
        reason: String,
    },
    Error {
        message: String,
    },
}

/// Body of `PUT /api/tasks/{id}/move`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub new_list_id: ListId,
    /// Provisional position computed by the client; the server only uses it
    /// to recover the intended slot.
    pub new_position: f64,
}

impl MoveRequest {
    pub fn validate(&self) -> crate::Result<()> {
        validate_position(self.new_position)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    pub board_id: BoardId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateListRequest {
    pub title: String,
}

/// Body of `PUT /api/lists/{id}/move`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveListRequest {
    pub new_position: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub list_id: ListId,
    pub title: String,
}

/// Partial update of a task. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// An empty string clears the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear_due_date: bool,
    /// Replaces the assignee set. Every id must belong to a board member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<UserId>>,
}

impl TaskPatch {
    /// Check the patch and return the normalized title, if one was given.
    pub fn validate(&self) -> crate::Result<Option<String>> {
        let title = self
            .title
            .as_deref()
            .map(|raw| validate_title("Title", raw))
            .transpose()?;
        Ok(title)
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Everything a client needs to build a [`crate::BoardView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,
    pub lists: Vec<List>,
    pub members: Vec<Member>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
