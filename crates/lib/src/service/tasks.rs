use serde_json::json;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use super::{BoardService, ServiceError};
use crate::{
    Result,
    model::{
        ActivityAction, BoardId, Task, TaskId, UserId, UserSummary, dedup_assignees,
        validate_title,
    },
    position::{Placement, compute_position, index_for_position, place},
    protocol::{BoardEvent, CreateTaskRequest, MoveRequest, TaskPatch},
};

impl BoardService {
    /// Append a task to a list. The creator is its first assignee.
    pub async fn create_task(&self, user: UserId, request: CreateTaskRequest) -> Result<Task> {
        let title = validate_title("Title", &request.title)?;
        let list = self.list(request.list_id).await?;
        let member = self.ensure_member(list.board_id, user).await?;

        let _guard = self.inner.list_locks.lock(list.id).await;
        // The list may have been deleted while waiting for the lock
        let list = self.list(list.id).await?;
        let siblings: Vec<f64> = self
            .storage()
            .tasks_in_list(list.id)
            .await
            .iter()
            .map(|task| task.position)
            .collect();
        let now = self.inner.clock.now();
        let task = Task {
            id: TaskId::new(),
            title,
            description: None,
            priority: Default::default(),
            due_date: None,
            position: compute_position(&siblings, siblings.len()),
            list_id: list.id,
            assignees: vec![member.user],
            created_at: now,
            updated_at: now,
        };
        self.storage().put_task(task.clone()).await;
        self.record(
            list.board_id,
            user,
            Some(task.id),
            ActivityAction::TaskCreated,
            json!({ "title": task.title }),
        )
        .await;
        self.publish(list.board_id, BoardEvent::TaskCreated(task.clone()))
            .await;
        Ok(task)
    }

    /// Change a task's fields. Position and list are only changed by moves.
    pub async fn update_task(
        &self,
        user: UserId,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task> {
        if patch.is_empty() {
            return Err(ServiceError::EmptyUpdate.into());
        }
        let title = patch.validate()?;
        let task = self.task(task_id).await?;
        let board_id = self.list(task.list_id).await?.board_id;
        self.ensure_member(board_id, user).await?;

        let assignees = match &patch.assignee_ids {
            Some(ids) => Some(self.resolve_assignees(board_id, ids).await?),
            None => None,
        };

        let (_guard, mut task) = self.lock_task(task_id).await?;
        let mut changed = Vec::new();
        if let Some(title) = title {
            task.title = title;
            changed.push("title");
        }
        if let Some(description) = patch.description {
            let description = description.trim();
            task.description = (!description.is_empty()).then(|| description.to_string());
            changed.push("description");
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
            changed.push("priority");
        }
        if patch.clear_due_date {
            task.due_date = None;
            changed.push("dueDate");
        } else if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
            changed.push("dueDate");
        }
        if let Some(assignees) = assignees {
            task.assignees = assignees;
            changed.push("assignees");
        }
        task.updated_at = self.inner.clock.now();

        self.storage().put_task(task.clone()).await;
        self.record(
            board_id,
            user,
            Some(task_id),
            ActivityAction::TaskUpdated,
            json!({ "title": task.title, "fields": changed }),
        )
        .await;
        self.publish(board_id, BoardEvent::TaskUpdated(task.clone()))
            .await;
        Ok(task)
    }

    /// Move a task to a slot of a list on the same board.
    ///
    /// `request.new_position` is the client's provisional value. The server
    /// only uses it to find the slot the client meant, then derives the
    /// stored position from the neighbours it holds. When the gap at that
    /// slot is exhausted the destination list is renumbered and a
    /// `task:moved` event is published for every task whose position changed.
    pub async fn move_task(
        &self,
        user: UserId,
        task_id: TaskId,
        request: MoveRequest,
    ) -> Result<Task> {
        request.validate()?;
        let task = self.task(task_id).await?;
        let board_id = self.list(task.list_id).await?.board_id;
        self.ensure_member(board_id, user).await?;
        let destination = self.list(request.new_list_id).await?;
        if destination.board_id != board_id {
            return Err(ServiceError::CrossBoardMove {
                task_id,
                list_id: destination.id,
            }
            .into());
        }

        // Source and destination are both held; the task may change lists
        // while we wait, so the source is re-checked under the lock.
        let (_guards, mut task) = loop {
            let from_list = self.task(task_id).await?.list_id;
            let guards = self
                .inner
                .list_locks
                .lock_many(&[from_list, destination.id])
                .await;
            let task = self.task(task_id).await?;
            if task.list_id == from_list {
                break (guards, task);
            }
        };
        self.list(destination.id).await?;
        let from_list = task.list_id;
        let mut siblings = self.storage().tasks_in_list(destination.id).await;
        siblings.retain(|other| other.id != task_id);
        let positions: Vec<f64> = siblings.iter().map(|other| other.position).collect();
        let index = index_for_position(&positions, request.new_position);

        let now = self.inner.clock.now();
        let mut renumbered = Vec::new();
        match place(&positions, index) {
            Placement::Fits(position) => task.position = position,
            Placement::Rebalanced {
                position,
                siblings: fresh,
            } => {
                task.position = position;
                for (mut sibling, position) in siblings.into_iter().zip(fresh) {
                    if sibling.position != position {
                        sibling.position = position;
                        sibling.updated_at = now;
                        renumbered.push(sibling);
                    }
                }
                info!(
                    list_id = %destination.id,
                    renumbered = renumbered.len(),
                    "rebalanced list"
                );
            }
        }
        task.list_id = destination.id;
        task.updated_at = now;

        let mut batch = renumbered.clone();
        batch.push(task.clone());
        self.storage().put_tasks(batch).await;
        self.record(
            board_id,
            user,
            Some(task_id),
            ActivityAction::TaskMoved,
            json!({
                "title": task.title,
                "fromListId": from_list,
                "toListId": destination.id,
            }),
        )
        .await;
        for sibling in renumbered {
            self.publish(board_id, BoardEvent::TaskMoved(sibling)).await;
        }
        self.publish(board_id, BoardEvent::TaskMoved(task.clone()))
            .await;
        debug!(%task_id, to = %destination.id, index, position = task.position, "moved task");
        Ok(task)
    }

    /// Delete a task. Its siblings keep their positions.
    pub async fn delete_task(&self, user: UserId, task_id: TaskId) -> Result<Task> {
        let task = self.task(task_id).await?;
        let board_id = self.list(task.list_id).await?.board_id;
        self.ensure_member(board_id, user).await?;

        let (_guard, _) = self.lock_task(task_id).await?;
        let task = self
            .storage()
            .delete_task(task_id)
            .await
            .ok_or(ServiceError::TaskNotFound { task_id })?;
        self.record(
            board_id,
            user,
            Some(task_id),
            ActivityAction::TaskDeleted,
            json!({ "title": task.title }),
        )
        .await;
        self.publish(board_id, BoardEvent::TaskDeleted { task_id })
            .await;
        Ok(task)
    }

    async fn task(&self, task_id: TaskId) -> Result<Task> {
        self.storage()
            .task(task_id)
            .await
            .ok_or_else(|| ServiceError::TaskNotFound { task_id }.into())
    }

    /// Lock the list currently holding a task and return a fresh copy of it.
    ///
    /// A concurrent move can take the task to another list while we wait, so
    /// the list is re-checked after the lock is acquired.
    async fn lock_task(&self, task_id: TaskId) -> Result<(OwnedMutexGuard<()>, Task)> {
        loop {
            let list_id = self.task(task_id).await?.list_id;
            let guard = self.inner.list_locks.lock(list_id).await;
            let task = self.task(task_id).await?;
            if task.list_id == list_id {
                return Ok((guard, task));
            }
        }
    }

    /// Map user ids to board members, keeping set semantics.
    async fn resolve_assignees(
        &self,
        board_id: BoardId,
        ids: &[UserId],
    ) -> Result<Vec<UserSummary>> {
        let members = self.storage().members(board_id).await;
        let assignees = ids
            .iter()
            .map(|id| {
                members
                    .iter()
                    .find(|member| member.user.id == *id)
                    .map(|member| member.user.clone())
                    .ok_or(ServiceError::UnknownAssignee { user_id: *id })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dedup_assignees(assignees))
    }
}
