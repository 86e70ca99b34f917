//! Drag-and-drop move coordination.
//!
//! A gesture goes through `drag_start`, any number of `drag_over` calls and
//! finally `drop` (or `cancel`). Dropping applies the move to the view right
//! away and produces a [`PendingMove`]; committing it sends the request to the
//! server and either applies the authoritative task or puts the task back
//! where it was before the drop.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    Result,
    model::{ListId, Task, TaskId},
    position::compute_position,
    protocol::MoveRequest,
    view::{BoardView, ViewError},
};

/// The server call a coordinator needs.
#[async_trait]
pub trait MoveApi: Send + Sync {
    /// Ask the server to move a task; returns the authoritative task.
    async fn move_task(&self, task_id: TaskId, request: MoveRequest) -> Result<Task>;
}

/// What the pointer is currently over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Another task: land at its index.
    Task(TaskId),
    /// A list's empty area: land at the tail.
    List(ListId),
}

/// Transient state of an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub task_id: TaskId,
    pub from: ListId,
    pub to: ListId,
    pub to_index: usize,
}

/// A move that has been applied locally but not yet confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub task_id: TaskId,
    pub request: MoveRequest,
    origin: Task,
    origin_index: usize,
    landed_index: usize,
}

impl PendingMove {
    /// The list the task was dragged out of.
    pub fn origin_list(&self) -> ListId {
        self.origin.list_id
    }
}

/// Turns drag gestures into optimistic moves plus server requests.
pub struct MoveCoordinator<A> {
    api: A,
    drag: Option<DragState>,
}

impl<A: MoveApi> MoveCoordinator<A> {
    pub fn new(api: A) -> Self {
        Self { api, drag: None }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// The gesture in progress, if any.
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Begin dragging a task. The initial destination is where it already is.
    pub fn drag_start(&mut self, view: &BoardView, task_id: TaskId) -> Result<DragState> {
        let (from, index) = view
            .locate(task_id)
            .ok_or(ViewError::UnknownTask { task_id })?;
        let state = DragState {
            task_id,
            from,
            to: from,
            to_index: index,
        };
        self.drag = Some(state);
        Ok(state)
    }

    /// Update the provisional destination. Targets that are not on the board
    /// are ignored. Never mutates the view.
    pub fn drag_over(&mut self, view: &BoardView, target: DropTarget) -> Option<DragState> {
        let state = self.drag.as_mut()?;

        let (list_id, over) = match target {
            DropTarget::Task(over) if over == state.task_id => return Some(*state),
            DropTarget::Task(over) => match view.locate(over) {
                Some((list_id, _)) => (list_id, Some(over)),
                None => return Some(*state),
            },
            DropTarget::List(list_id) => (list_id, None),
        };
        let Some(list) = view.list(list_id) else {
            return Some(*state);
        };

        let dragged = state.task_id;
        let remaining: Vec<TaskId> = list
            .tasks
            .iter()
            .map(|task| task.id)
            .filter(|id| *id != dragged)
            .collect();
        let to_index = over
            .and_then(|over| remaining.iter().position(|id| *id == over))
            .unwrap_or(remaining.len());

        state.to = list_id;
        state.to_index = to_index;
        Some(*state)
    }

    /// Abandon the gesture. Nothing is mutated or sent.
    pub fn cancel(&mut self) -> Option<DragState> {
        self.drag.take()
    }

    /// Finish the gesture: move the task in the view and build the request.
    ///
    /// Returns `Ok(None)` when no drag was in progress.
    pub fn drop(&mut self, view: &mut BoardView) -> Result<Option<PendingMove>> {
        let Some(state) = self.drag.take() else {
            return Ok(None);
        };
        let task_id = state.task_id;
        let (origin_list, origin_index) = view
            .locate(task_id)
            .ok_or(ViewError::UnknownTask { task_id })?;
        let origin = view
            .task(task_id)
            .cloned()
            .ok_or(ViewError::UnknownTask { task_id })?;

        let landed =
            view.reorder_within_collection(task_id, origin_list, state.to, state.to_index)?;
        let siblings = view
            .sibling_positions(state.to, task_id)
            .ok_or(ViewError::UnknownList { list_id: state.to })?;
        let new_position = compute_position(&siblings, landed);

        debug!(%task_id, to = %state.to, landed, new_position, "dropped task");
        Ok(Some(PendingMove {
            task_id,
            request: MoveRequest {
                new_list_id: state.to,
                new_position,
            },
            origin,
            origin_index,
            landed_index: landed,
        }))
    }

    /// Send a pending move and settle the view with the outcome.
    ///
    /// On success the confirmed task replaces the optimistic copy. When the
    /// server had to renumber the destination list, the response carries
    /// only the moved task: its new position is compared against siblings
    /// that still hold their old positions, so the list can show the task
    /// out of place until the `task:moved` events for the renumbered
    /// siblings are reconciled into the view.
    ///
    /// On rejection the task is put back at its pre-drop list and index and
    /// the server's error is returned.
    pub async fn commit(&self, view: &mut BoardView, pending: PendingMove) -> Result<Task> {
        let PendingMove {
            task_id,
            request,
            origin,
            origin_index,
            landed_index,
        } = pending;

        match self.api.move_task(task_id, request).await {
            Ok(task) => {
                view.apply_authoritative(task.clone())?;
                if let Some((_, index)) = view.locate(task_id) {
                    if index != landed_index {
                        debug!(
                            %task_id,
                            landed_index,
                            index,
                            "confirmed position outside local neighbours, list was renumbered"
                        );
                    }
                }
                Ok(task)
            }
            Err(err) => {
                warn!(%task_id, error = %err, "move rejected, rolling back");
                if let Err(restore_err) = view.place_task(origin, origin_index) {
                    // The origin list vanished meanwhile; the next resync will drop the task.
                    warn!(%task_id, error = %restore_err, "could not restore task");
                }
                Err(err)
            }
        }
    }

    /// [`drop`](Self::drop) followed by [`commit`](Self::commit).
    pub async fn drop_and_commit(&mut self, view: &mut BoardView) -> Result<Option<Task>> {
        match self.drop(view)? {
            Some(pending) => self.commit(view, pending).await.map(Some),
            None => Ok(None),
        }
    }
}
