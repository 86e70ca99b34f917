//! Board entities and their boundary validation.
//!
//! These are the shapes shared by the server, the wire protocol and the
//! client-side view. Ordering is never stored: a list's tasks (and a board's
//! lists) are always recovered by sorting on `position`.

mod errors;
mod ids;

use std::{cmp::Ordering, collections::HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_TITLE_LEN;

pub use errors::ModelError;
pub use ids::{ActivityId, BoardId, ListId, TaskId, UserId};

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Role of a member within a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Member,
}

/// Public identity of a user, as embedded in tasks and memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A unit of work. Belongs to exactly one list at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub position: f64,
    pub list_id: ListId,
    /// Set semantics: order is irrelevant and ids are unique.
    #[serde(default)]
    pub assignees: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A column of tasks within a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    pub position: f64,
    /// Derived from each task's position; empty in `list:*` event payloads.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Top-level container of lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub board_id: BoardId,
    pub user: UserSummary,
    pub role: Role,
}

/// Kinds of activity recorded against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    BoardCreated,
    BoardUpdated,
    ListCreated,
    ListUpdated,
    ListDeleted,
    TaskCreated,
    TaskUpdated,
    TaskMoved,
    TaskDeleted,
    MemberAdded,
    MemberRemoved,
}

/// One entry in a board's activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub board_id: BoardId,
    pub user_id: UserId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub action: ActivityAction,
    #[serde(default)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Anything ordered among its siblings by a position.
pub trait Positioned {
    fn position(&self) -> f64;

    /// Stable tiebreak so that equal positions still sort deterministically.
    fn tiebreak(&self) -> Uuid;
}

impl Positioned for Task {
    fn position(&self) -> f64 {
        self.position
    }

    fn tiebreak(&self) -> Uuid {
        *self.id.as_uuid()
    }
}

impl Positioned for List {
    fn position(&self) -> f64 {
        self.position
    }

    fn tiebreak(&self) -> Uuid {
        *self.id.as_uuid()
    }
}

fn compare_positioned<T: Positioned>(a: &T, b: &T) -> Ordering {
    a.position()
        .total_cmp(&b.position())
        .then_with(|| a.tiebreak().cmp(&b.tiebreak()))
}

/// Sort siblings ascending by position.
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by(compare_positioned);
}

/// Check whether siblings are in ascending position order.
pub fn is_sorted_by_position<T: Positioned>(items: &[T]) -> bool {
    items
        .windows(2)
        .all(|pair| compare_positioned(&pair[0], &pair[1]) != Ordering::Greater)
}

/// Trim a title and check it is non-empty and within [`MAX_TITLE_LEN`].
pub fn validate_title(field: &'static str, raw: &str) -> Result<String, ModelError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ModelError::EmptyTitle { field });
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ModelError::TitleTooLong {
            field,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title.to_string())
}

/// Reject NaN and infinite positions.
pub fn validate_position(value: f64) -> Result<f64, ModelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::NonFinitePosition { value })
    }
}

impl Task {
    /// Check a task payload received from another party.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_title("Title", &self.title)?;
        validate_position(self.position)?;
        Ok(())
    }
}

impl List {
    /// Check a list payload, including every nested task.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_title("Title", &self.title)?;
        validate_position(self.position)?;
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            task.validate()?;
            if task.list_id != self.id {
                return Err(ModelError::ListMismatch {
                    task_id: task.id.to_string(),
                    declared: task.list_id.to_string(),
                    container: self.id.to_string(),
                });
            }
            if !seen.insert(task.id) {
                return Err(ModelError::DuplicateId {
                    kind: "task",
                    id: task.id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// A copy of this list's metadata without its tasks.
    pub fn without_tasks(&self) -> List {
        List {
            tasks: Vec::new(),
            ..self.clone()
        }
    }
}

/// Deduplicate assignees by user id, keeping the first occurrence.
pub fn dedup_assignees(assignees: Vec<UserSummary>) -> Vec<UserSummary> {
    let mut seen = HashSet::with_capacity(assignees.len());
    assignees
        .into_iter()
        .filter(|user| seen.insert(user.id))
        .collect()
}
