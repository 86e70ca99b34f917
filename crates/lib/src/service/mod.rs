//! The authoritative write path.
//!
//! [`BoardService`] owns the store and the hub. Every operation checks the
//! acting user's membership, validates its input, writes the store and then
//! publishes the resulting event to the board's room. Writes that depend on
//! the current order of a list (appending, moving, renumbering) run under
//! that list's lock; writes that depend on the order of a board's lists run
//! under the board's lock.

mod errors;
mod lists;
mod locks;
mod members;
mod tasks;


use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::{
    Clock, Result, SystemClock,
    constants::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_RECENT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT},
    hub::BoardHub,
    model::{
        ActivityAction, ActivityEntry, ActivityId, Board, BoardId, ListId, Member, Role, TaskId,
        UserId, UserSummary, validate_title,
    },
    protocol::{BoardEvent, BoardSnapshot, CreateBoardRequest},
    storage::Storage,
};

pub use errors::ServiceError;
use locks::LockRegistry;

struct Inner {
    storage: Storage,
    hub: BoardHub,
    clock: Arc<dyn Clock>,
    list_locks: LockRegistry<ListId>,
    board_locks: LockRegistry<BoardId>,
}

/// Authoritative board operations. Cheap to clone.
#[derive(Clone)]
pub struct BoardService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for BoardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardService")
            .field("clock", &self.inner.clock)
            .finish_non_exhaustive()
    }
}

impl BoardService {
    pub fn new(storage: Storage, hub: BoardHub) -> Self {
        Self::with_clock(storage, hub, Arc::new(SystemClock))
    }

    /// Create a service that takes timestamps from `clock`.
    pub fn with_clock(storage: Storage, hub: BoardHub, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                hub,
                clock,
                list_locks: LockRegistry::default(),
                board_locks: LockRegistry::default(),
            }),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    pub fn hub(&self) -> &BoardHub {
        &self.inner.hub
    }

    /// Create a board. The creator becomes its owner and first admin.
    pub async fn create_board(
        &self,
        owner: UserSummary,
        request: CreateBoardRequest,
    ) -> Result<Board> {
        let title = validate_title("Title", &request.title)?;
        let board = Board {
            id: BoardId::new(),
            title,
            owner_id: owner.id,
            created_at: self.inner.clock.now(),
        };
        let storage = self.storage();
        storage.put_board(board.clone()).await;
        storage
            .add_member(Member {
                board_id: board.id,
                user: owner.clone(),
                role: Role::Admin,
            })
            .await;
        self.record(
            board.id,
            owner.id,
            None,
            ActivityAction::BoardCreated,
            json!({ "title": board.title }),
        )
        .await;
        info!(board_id = %board.id, owner = %owner.id, "created board");
        Ok(board)
    }

    /// Boards the user belongs to, newest first.
    pub async fn list_boards(&self, user: UserId) -> Vec<Board> {
        self.storage().boards_for_user(user).await
    }

    /// Rename a board. Any member may do this.
    pub async fn rename_board(
        &self,
        user: UserId,
        board_id: BoardId,
        request: CreateBoardRequest,
    ) -> Result<Board> {
        let title = validate_title("Title", &request.title)?;
        self.ensure_member(board_id, user).await?;
        let _guard = self.inner.board_locks.lock(board_id).await;
        let mut board = self.board(board_id).await?;
        let old_title = std::mem::replace(&mut board.title, title);
        self.storage().put_board(board.clone()).await;
        self.record(
            board_id,
            user,
            None,
            ActivityAction::BoardUpdated,
            json!({ "oldTitle": old_title, "newTitle": board.title }),
        )
        .await;
        Ok(board)
    }

    /// Delete a board and everything on it. Owner only.
    ///
    /// Holds the board lock and every list lock of the board, so no list or
    /// task write can land after the rows are gone. Subscribers of the board's
    /// room are disconnected from it.
    pub async fn delete_board(&self, user: UserId, board_id: BoardId) -> Result<Board> {
        let board = self.board(board_id).await?;
        if board.owner_id != user {
            return Err(ServiceError::OwnerRequired { board_id }.into());
        }
        let _board_guard = self.inner.board_locks.lock(board_id).await;
        let list_ids: Vec<ListId> = self
            .storage()
            .lists_for_board(board_id)
            .await
            .iter()
            .map(|list| list.id)
            .collect();
        let list_guards = self.inner.list_locks.lock_many(&list_ids).await;
        let board = self
            .storage()
            .delete_board(board_id)
            .await
            .ok_or(ServiceError::BoardNotFound { board_id })?;
        self.hub().close(board_id).await;
        drop(list_guards);
        for list_id in list_ids {
            self.inner.list_locks.forget(list_id).await;
        }
        info!(%board_id, "deleted board");
        Ok(board)
    }

    /// Everything a client needs to render the board.
    pub async fn board_snapshot(&self, user: UserId, board_id: BoardId) -> Result<BoardSnapshot> {
        self.ensure_member(board_id, user).await?;
        let board = self.board(board_id).await?;
        let storage = self.storage();
        let mut lists = storage.lists_for_board(board_id).await;
        for list in &mut lists {
            list.tasks = storage.tasks_in_list(list.id).await;
        }
        Ok(BoardSnapshot {
            board,
            lists,
            members: storage.members(board_id).await,
        })
    }

    /// Recent activity on a board, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_ACTIVITY_LIMIT`] and is capped at
    /// [`MAX_ACTIVITY_LIMIT`].
    pub async fn board_activity(
        &self,
        user: UserId,
        board_id: BoardId,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityEntry>> {
        self.ensure_member(board_id, user).await?;
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        Ok(self.storage().activity(board_id, limit).await)
    }

    /// The user's feed: recent activity on every board they belong to,
    /// newest first. `limit` defaults to [`DEFAULT_RECENT_ACTIVITY_LIMIT`].
    pub async fn recent_activity(&self, user: UserId, limit: Option<usize>) -> Vec<ActivityEntry> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        self.storage().recent_activity_for_user(user, limit).await
    }

    /// Whether the user belongs to the board.
    pub async fn is_member(&self, board_id: BoardId, user: UserId) -> bool {
        self.storage().member(board_id, user).await.is_some()
    }

    /// The acting user's membership, or the reason they have none.
    pub async fn ensure_member(&self, board_id: BoardId, user: UserId) -> Result<Member> {
        match self.storage().member(board_id, user).await {
            Some(member) => Ok(member),
            None => {
                self.board(board_id).await?;
                Err(ServiceError::NotAMember {
                    board_id,
                    user_id: user,
                }
                .into())
            }
        }
    }

    async fn ensure_admin(
        &self,
        board_id: BoardId,
        user: UserId,
        action: &'static str,
    ) -> Result<Member> {
        let member = self.ensure_member(board_id, user).await?;
        if member.role != Role::Admin {
            return Err(ServiceError::AdminRequired { board_id, action }.into());
        }
        Ok(member)
    }

    async fn board(&self, board_id: BoardId) -> Result<Board> {
        self.storage()
            .board(board_id)
            .await
            .ok_or_else(|| ServiceError::BoardNotFound { board_id }.into())
    }

    async fn record(
        &self,
        board_id: BoardId,
        user_id: UserId,
        task_id: Option<TaskId>,
        action: ActivityAction,
        details: serde_json::Value,
    ) {
        self.storage()
            .push_activity(ActivityEntry {
                id: ActivityId::new(),
                board_id,
                user_id,
                task_id,
                action,
                details,
                created_at: self.inner.clock.now(),
            })
            .await;
    }

    async fn publish(&self, board_id: BoardId, event: BoardEvent) {
        let name = event.name();
        let delivered = self.hub().publish(board_id, event).await;
        debug!(%board_id, event = name, delivered, "broadcast board event");
    }
}
