use serde_json::json;
use tracing::info;

use super::{BoardService, ServiceError};
use crate::{
    Result,
    model::{ActivityAction, List, ListId, UserId, validate_position, validate_title},
    position::{Placement, compute_position, index_for_position, place},
    protocol::{BoardEvent, CreateListRequest, MoveListRequest, UpdateListRequest},
};

impl BoardService {
    /// Append a list to the end of a board.
    pub async fn create_list(&self, user: UserId, request: CreateListRequest) -> Result<List> {
        let title = validate_title("Title", &request.title)?;
        let board_id = request.board_id;
        self.ensure_member(board_id, user).await?;

        let _guard = self.inner.board_locks.lock(board_id).await;
        // The board may have been deleted while waiting for the lock
        self.board(board_id).await?;
        let siblings: Vec<f64> = self
            .storage()
            .lists_for_board(board_id)
            .await
            .iter()
            .map(|list| list.position)
            .collect();
        let list = List {
            id: ListId::new(),
            board_id,
            title,
            position: compute_position(&siblings, siblings.len()),
            tasks: Vec::new(),
        };
        self.storage().put_list(list.clone()).await;
        self.record(
            board_id,
            user,
            None,
            ActivityAction::ListCreated,
            json!({ "title": list.title }),
        )
        .await;
        self.publish(board_id, BoardEvent::ListCreated(list.clone()))
            .await;
        Ok(list)
    }

    pub async fn rename_list(
        &self,
        user: UserId,
        list_id: ListId,
        request: UpdateListRequest,
    ) -> Result<List> {
        let title = validate_title("Title", &request.title)?;
        let list = self.list(list_id).await?;
        self.ensure_member(list.board_id, user).await?;

        let _guard = self.inner.board_locks.lock(list.board_id).await;
        let mut list = self.list(list_id).await?;
        let old_title = std::mem::replace(&mut list.title, title);
        self.storage().put_list(list.clone()).await;
        self.record(
            list.board_id,
            user,
            None,
            ActivityAction::ListUpdated,
            json!({ "oldTitle": old_title, "newTitle": list.title }),
        )
        .await;
        self.publish(list.board_id, BoardEvent::ListUpdated(list.clone()))
            .await;
        Ok(list)
    }

    /// Reorder a list within its board.
    ///
    /// `new_position` is the client's provisional value; the slot it falls
    /// into among the other lists decides the stored position.
    pub async fn move_list(
        &self,
        user: UserId,
        list_id: ListId,
        request: MoveListRequest,
    ) -> Result<List> {
        let proposed = validate_position(request.new_position)?;
        let list = self.list(list_id).await?;
        let board_id = list.board_id;
        self.ensure_member(board_id, user).await?;

        let _guard = self.inner.board_locks.lock(board_id).await;
        self.board(board_id).await?;
        let mut list = self.list(list_id).await?;
        let mut siblings = self.storage().lists_for_board(board_id).await;
        siblings.retain(|other| other.id != list_id);
        let positions: Vec<f64> = siblings.iter().map(|other| other.position).collect();
        let index = index_for_position(&positions, proposed);

        let mut renumbered = Vec::new();
        match place(&positions, index) {
            Placement::Fits(position) => list.position = position,
            Placement::Rebalanced {
                position,
                siblings: fresh,
            } => {
                list.position = position;
                for (mut sibling, position) in siblings.into_iter().zip(fresh) {
                    if sibling.position != position {
                        sibling.position = position;
                        renumbered.push(sibling);
                    }
                }
            }
        }

        let mut batch = renumbered.clone();
        batch.push(list.clone());
        self.storage().put_lists(batch).await;
        self.record(
            board_id,
            user,
            None,
            ActivityAction::ListUpdated,
            json!({ "title": list.title, "position": list.position }),
        )
        .await;
        for sibling in renumbered {
            self.publish(board_id, BoardEvent::ListUpdated(sibling)).await;
        }
        self.publish(board_id, BoardEvent::ListUpdated(list.clone()))
            .await;
        Ok(list)
    }

    /// Delete a list and all of its tasks. Admin only.
    pub async fn delete_list(&self, user: UserId, list_id: ListId) -> Result<List> {
        let list = self.list(list_id).await?;
        let board_id = list.board_id;
        self.ensure_admin(board_id, user, "delete lists").await?;

        let _board_guard = self.inner.board_locks.lock(board_id).await;
        let list_guard = self.inner.list_locks.lock(list_id).await;
        let (list, tasks) = self
            .storage()
            .delete_list(list_id)
            .await
            .ok_or(ServiceError::ListNotFound { list_id })?;
        self.record(
            board_id,
            user,
            None,
            ActivityAction::ListDeleted,
            json!({ "title": list.title, "tasks": tasks.len() }),
        )
        .await;
        self.publish(board_id, BoardEvent::ListDeleted { list_id })
            .await;
        info!(%board_id, %list_id, tasks = tasks.len(), "deleted list");
        drop(list_guard);
        self.inner.list_locks.forget(list_id).await;
        Ok(list)
    }

    pub(super) async fn list(&self, list_id: ListId) -> Result<List> {
        self.storage()
            .list(list_id)
            .await
            .ok_or_else(|| ServiceError::ListNotFound { list_id }.into())
    }
}
