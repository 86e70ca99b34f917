//! In-memory table store for the authoritative service.
//!
//! Each table lives behind one `tokio::sync::RwLock`. Every method takes and
//! releases its guard before returning, so a method call behaves like a
//! single-row (or single-batch) statement against a relational store. Callers
//! that need read-compute-write atomicity serialize through the service's
//! per-list locks.
//!
//! The whole store can be written to and restored from a JSON file.

mod persistence;

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use tokio::sync::RwLock;

use crate::{
    Result,
    model::{
        ActivityEntry, Board, BoardId, List, ListId, Member, Task, TaskId, UserId,
        sort_by_position,
    },
};

/// Row counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    pub boards: usize,
    pub lists: usize,
    pub tasks: usize,
    pub members: usize,
    pub activity: usize,
}

/// In-memory tables.
#[derive(Debug, Default)]
pub struct Storage {
    pub(crate) boards: RwLock<HashMap<BoardId, Board>>,
    /// Lists are stored without their tasks.
    pub(crate) lists: RwLock<HashMap<ListId, List>>,
    pub(crate) tasks: RwLock<HashMap<TaskId, Task>>,
    /// Members per board, in join order.
    pub(crate) members: RwLock<HashMap<BoardId, Vec<Member>>>,
    /// Append-only activity log.
    pub(crate) activity: RwLock<Vec<ActivityEntry>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save every table to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Load a store from `path`. A missing file yields an empty store.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }

    pub async fn stats(&self) -> StorageStats {
        StorageStats {
            boards: self.boards.read().await.len(),
            lists: self.lists.read().await.len(),
            tasks: self.tasks.read().await.len(),
            members: self.members.read().await.values().map(Vec::len).sum(),
            activity: self.activity.read().await.len(),
        }
    }

    // Boards

    pub async fn board(&self, board_id: BoardId) -> Option<Board> {
        self.boards.read().await.get(&board_id).cloned()
    }

    pub async fn put_board(&self, board: Board) {
        self.boards.write().await.insert(board.id, board);
    }

    /// Remove a board together with its lists, tasks, members and activity.
    pub async fn delete_board(&self, board_id: BoardId) -> Option<Board> {
        let board = self.boards.write().await.remove(&board_id)?;
        let list_ids: Vec<ListId> = {
            let mut lists = self.lists.write().await;
            let ids = lists
                .values()
                .filter(|list| list.board_id == board_id)
                .map(|list| list.id)
                .collect::<Vec<_>>();
            for id in &ids {
                lists.remove(id);
            }
            ids
        };
        self.tasks
            .write()
            .await
            .retain(|_, task| !list_ids.contains(&task.list_id));
        self.members.write().await.remove(&board_id);
        self.activity
            .write()
            .await
            .retain(|entry| entry.board_id != board_id);
        Some(board)
    }

    /// Every board, most recently created first.
    pub async fn all_boards(&self) -> Vec<Board> {
        let mut boards: Vec<Board> = self.boards.read().await.values().cloned().collect();
        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        boards
    }

    /// Boards the user belongs to, most recently created first.
    pub async fn boards_for_user(&self, user_id: UserId) -> Vec<Board> {
        let board_ids: Vec<BoardId> = self
            .members
            .read()
            .await
            .iter()
            .filter(|(_, members)| members.iter().any(|m| m.user.id == user_id))
            .map(|(board_id, _)| *board_id)
            .collect();
        let boards = self.boards.read().await;
        let mut found: Vec<Board> = board_ids
            .iter()
            .filter_map(|id| boards.get(id).cloned())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    // Lists

    pub async fn list(&self, list_id: ListId) -> Option<List> {
        self.lists.read().await.get(&list_id).cloned()
    }

    /// A board's lists in position order, without tasks.
    pub async fn lists_for_board(&self, board_id: BoardId) -> Vec<List> {
        let mut lists: Vec<List> = self
            .lists
            .read()
            .await
            .values()
            .filter(|list| list.board_id == board_id)
            .cloned()
            .collect();
        sort_by_position(&mut lists);
        lists
    }

    pub async fn put_list(&self, list: List) {
        self.lists.write().await.insert(list.id, list.without_tasks());
    }

    /// Write several lists in one step.
    pub async fn put_lists(&self, batch: Vec<List>) {
        let mut lists = self.lists.write().await;
        for list in batch {
            lists.insert(list.id, list.without_tasks());
        }
    }

    /// Remove a list and every task in it. Returns the list and its tasks.
    pub async fn delete_list(&self, list_id: ListId) -> Option<(List, Vec<Task>)> {
        let list = self.lists.write().await.remove(&list_id)?;
        let mut tasks = self.tasks.write().await;
        let doomed: Vec<TaskId> = tasks
            .values()
            .filter(|task| task.list_id == list_id)
            .map(|task| task.id)
            .collect();
        let removed = doomed.iter().filter_map(|id| tasks.remove(id)).collect();
        Some((list, removed))
    }

    // Tasks

    pub async fn task(&self, task_id: TaskId) -> Option<Task> {
        self.tasks.read().await.get(&task_id).cloned()
    }

    /// A list's tasks in position order.
    pub async fn tasks_in_list(&self, list_id: ListId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.list_id == list_id)
            .cloned()
            .collect();
        sort_by_position(&mut tasks);
        tasks
    }

    pub async fn put_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    /// Write several tasks in one step.
    pub async fn put_tasks(&self, batch: Vec<Task>) {
        let mut tasks = self.tasks.write().await;
        for task in batch {
            tasks.insert(task.id, task);
        }
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Option<Task> {
        self.tasks.write().await.remove(&task_id)
    }

    // Members

    pub async fn members(&self, board_id: BoardId) -> Vec<Member> {
        self.members
            .read()
            .await
            .get(&board_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn member(&self, board_id: BoardId, user_id: UserId) -> Option<Member> {
        self.members
            .read()
            .await
            .get(&board_id)?
            .iter()
            .find(|member| member.user.id == user_id)
            .cloned()
    }

    /// Add a member. Returns false if the user already belongs to the board.
    pub async fn add_member(&self, member: Member) -> bool {
        let mut members = self.members.write().await;
        let roster = members.entry(member.board_id).or_default();
        if roster.iter().any(|m| m.user.id == member.user.id) {
            return false;
        }
        roster.push(member);
        true
    }

    pub async fn remove_member(&self, board_id: BoardId, user_id: UserId) -> Option<Member> {
        let mut members = self.members.write().await;
        let roster = members.get_mut(&board_id)?;
        let index = roster.iter().position(|m| m.user.id == user_id)?;
        Some(roster.remove(index))
    }

    // Activity

    pub async fn push_activity(&self, entry: ActivityEntry) {
        self.activity.write().await.push(entry);
    }

    /// Most recent entries for a board, newest first.
    pub async fn activity(&self, board_id: BoardId, limit: usize) -> Vec<ActivityEntry> {
        self.activity
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.board_id == board_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recent entries across every board the user owns or belongs to,
    /// newest first.
    pub async fn recent_activity_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Vec<ActivityEntry> {
        let mut board_ids: HashSet<BoardId> = self
            .members
            .read()
            .await
            .iter()
            .filter(|(_, members)| members.iter().any(|m| m.user.id == user_id))
            .map(|(board_id, _)| *board_id)
            .collect();
        board_ids.extend(
            self.boards
                .read()
                .await
                .values()
                .filter(|board| board.owner_id == user_id)
                .map(|board| board.id),
        );
        self.activity
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| board_ids.contains(&entry.board_id))
            .take(limit)
            .cloned()
            .collect()
    }
}
