//! Client-side view of one board.
//!
//! [`BoardView`] is the single source of truth a client renders from. Lists
//! are kept in position order and so are the tasks inside each list, except
//! for the transient state created by
//! [`BoardView::reorder_within_collection`]: an optimistically moved task sits
//! at the index the user dropped it on until the authoritative position
//! arrives.
//!
//! Entity-bearing updates are idempotent by id, and removals of absent ids are
//! no-ops, so the same event can be delivered any number of times.

mod errors;


use std::{cmp::Ordering, collections::HashSet};

use tracing::trace;

use crate::{
    Result,
    model::{
        List, ListId, Member, ModelError, Positioned, Task, TaskId, UserId,
        is_sorted_by_position, sort_by_position,
    },
};

pub use errors::ViewError;

/// What an idempotent upsert did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The entity was not present before.
    Inserted,
    /// A different copy of the entity was replaced.
    Replaced,
    /// An identical copy was already in place.
    Unchanged,
}

/// Client-side board state: ordered lists of ordered tasks, plus members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView {
    lists: Vec<List>,
    members: Vec<Member>,
}

/// Index at which `item` belongs among `siblings`, assuming they are sorted.
fn slot_for<T: Positioned>(siblings: &[T], item: &T) -> usize {
    siblings.partition_point(|other| {
        other
            .position()
            .total_cmp(&item.position())
            .then_with(|| other.tiebreak().cmp(&item.tiebreak()))
            == Ordering::Less
    })
}

impl BoardView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from an initial load.
    pub fn from_lists(lists: Vec<List>, members: Vec<Member>) -> Result<Self> {
        let mut view = Self::new();
        view.replace_all(lists)?;
        view.members = members;
        Ok(view)
    }

    /// Wholesale reset, used on initial load and on resynchronization.
    ///
    /// The whole payload is validated first; on error the view is unchanged.
    pub fn replace_all(&mut self, mut lists: Vec<List>) -> Result<()> {
        let mut list_ids = HashSet::with_capacity(lists.len());
        let mut task_ids = HashSet::new();
        for list in &lists {
            list.validate()?;
            if !list_ids.insert(list.id) {
                return Err(ModelError::DuplicateId {
                    kind: "list",
                    id: list.id.to_string(),
                }
                .into());
            }
            for task in &list.tasks {
                if !task_ids.insert(task.id) {
                    return Err(ModelError::DuplicateId {
                        kind: "task",
                        id: task.id.to_string(),
                    }
                    .into());
                }
            }
        }

        for list in &mut lists {
            sort_by_position(&mut list.tasks);
        }
        sort_by_position(&mut lists);
        self.lists = lists;
        Ok(())
    }

    /// Replace the member roster.
    pub fn replace_members(&mut self, members: Vec<Member>) {
        self.members = members;
    }

    /// Add a list unless one with the same id is already present.
    pub fn insert_list(&mut self, mut list: List) -> Result<Upsert> {
        list.validate()?;
        if self.list_index(list.id).is_some() {
            return Ok(Upsert::Unchanged);
        }
        sort_by_position(&mut list.tasks);
        let slot = slot_for(&self.lists, &list);
        self.lists.insert(slot, list);
        Ok(Upsert::Inserted)
    }

    /// Upsert a list's metadata, keeping the tasks the view already holds.
    pub fn update_list(&mut self, list: List) -> Result<Upsert> {
        list.validate()?;
        let Some(index) = self.list_index(list.id) else {
            return self.insert_list(list);
        };

        let current = &self.lists[index];
        if current.title == list.title && current.position == list.position {
            return Ok(Upsert::Unchanged);
        }

        let mut updated = self.lists.remove(index);
        updated.title = list.title;
        updated.position = list.position;
        let slot = slot_for(&self.lists, &updated);
        self.lists.insert(slot, updated);
        Ok(Upsert::Replaced)
    }

    /// Remove a list and its tasks. Absent ids are a no-op.
    pub fn remove_list(&mut self, list_id: ListId) -> bool {
        let before = self.lists.len();
        self.lists.retain(|list| list.id != list_id);
        self.lists.len() != before
    }

    /// Insert a task into its declared list, deduplicated by id.
    pub fn insert_task(&mut self, task: Task) -> Result<Upsert> {
        task.validate()?;
        if self.locate(task.id).is_some() {
            return Ok(Upsert::Unchanged);
        }
        let list_id = task.list_id;
        let list = self
            .list_mut(list_id)
            .ok_or(ViewError::UnknownList { list_id })?;
        let slot = slot_for(&list.tasks, &task);
        list.tasks.insert(slot, task);
        Ok(Upsert::Inserted)
    }

    /// Optimistically move a task to `to_index` of list `to`.
    ///
    /// The task keeps its old `position` until the authoritative value is
    /// applied, so the destination list is temporarily out of position order.
    /// `to_index` is clamped to the destination length. Returns the index the
    /// task landed at.
    pub fn reorder_within_collection(
        &mut self,
        task_id: TaskId,
        from: ListId,
        to: ListId,
        to_index: usize,
    ) -> Result<usize> {
        if self.list_index(to).is_none() {
            return Err(ViewError::UnknownList { list_id: to }.into());
        }
        let from_index = self
            .list_index(from)
            .ok_or(ViewError::UnknownList { list_id: from })?;
        let Some(task_index) = self.lists[from_index]
            .tasks
            .iter()
            .position(|task| task.id == task_id)
        else {
            return Err(match self.locate(task_id) {
                Some(_) => ViewError::TaskNotInList {
                    task_id,
                    list_id: from,
                },
                None => ViewError::UnknownTask { task_id },
            }
            .into());
        };

        let mut task = self.lists[from_index].tasks.remove(task_index);
        task.list_id = to;
        let destination = self
            .list_mut(to)
            .ok_or(ViewError::UnknownList { list_id: to })?;
        let landed = to_index.min(destination.tasks.len());
        destination.tasks.insert(landed, task);
        trace!(%task_id, %from, %to, landed, "optimistic reorder");
        Ok(landed)
    }

    /// Apply a server-confirmed task: drop every copy by id, then insert it
    /// into its declared list at the slot its position dictates.
    ///
    /// Applying the same payload twice leaves the view as applying it once.
    pub fn apply_authoritative(&mut self, task: Task) -> Result<Upsert> {
        task.validate()?;
        let list_id = task.list_id;
        let destination = self
            .list_index(list_id)
            .ok_or(ViewError::UnknownList { list_id })?;

        let existing = self.locate(task.id);
        if let Some((current_list, index)) = existing {
            let tasks = &self.lists[destination].tasks;
            let in_slot = current_list == list_id
                && (index == 0 || tasks[index - 1].position <= task.position)
                && tasks
                    .get(index + 1)
                    .is_none_or(|next| task.position <= next.position);
            if in_slot && tasks[index] == task {
                return Ok(Upsert::Unchanged);
            }
        }

        self.remove_task(task.id);
        let tasks = &mut self.lists[destination].tasks;
        let slot = slot_for(tasks, &task);
        tasks.insert(slot, task);
        Ok(match existing {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        })
    }

    /// Put a task back at a specific index of its declared list.
    ///
    /// Used to roll back a rejected optimistic move. Any other copy of the
    /// task is removed first; `index` is clamped.
    pub fn place_task(&mut self, task: Task, index: usize) -> Result<()> {
        let list_id = task.list_id;
        let destination = self
            .list_index(list_id)
            .ok_or(ViewError::UnknownList { list_id })?;
        self.remove_task(task.id);
        let tasks = &mut self.lists[destination].tasks;
        let index = index.min(tasks.len());
        tasks.insert(index, task);
        Ok(())
    }

    /// Remove a task from every list. Absent ids are a no-op.
    pub fn remove_task(&mut self, task_id: TaskId) -> bool {
        let mut removed = false;
        for list in &mut self.lists {
            let before = list.tasks.len();
            list.tasks.retain(|task| task.id != task_id);
            removed |= list.tasks.len() != before;
        }
        removed
    }

    /// Add or replace a member, keyed by user id.
    pub fn upsert_member(&mut self, member: Member) -> Upsert {
        match self
            .members
            .iter_mut()
            .find(|existing| existing.user.id == member.user.id)
        {
            Some(existing) if *existing == member => Upsert::Unchanged,
            Some(existing) => {
                *existing = member;
                Upsert::Replaced
            }
            None => {
                self.members.push(member);
                Upsert::Inserted
            }
        }
    }

    /// Remove a member by user id. Absent ids are a no-op.
    pub fn remove_member(&mut self, user_id: UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member.user.id != user_id);
        self.members.len() != before
    }

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn list(&self, list_id: ListId) -> Option<&List> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.lists
            .iter()
            .flat_map(|list| list.tasks.iter())
            .find(|task| task.id == task_id)
    }

    /// Find the list holding a task and the task's index within it.
    pub fn locate(&self, task_id: TaskId) -> Option<(ListId, usize)> {
        self.lists.iter().find_map(|list| {
            list.tasks
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (list.id, index))
        })
    }

    /// Task ids of a list in display order.
    pub fn task_ids(&self, list_id: ListId) -> Vec<TaskId> {
        self.list(list_id)
            .map(|list| list.tasks.iter().map(|task| task.id).collect())
            .unwrap_or_default()
    }

    /// Positions of a list's tasks in display order, skipping `excluding`.
    pub fn sibling_positions(&self, list_id: ListId, excluding: TaskId) -> Option<Vec<f64>> {
        self.list(list_id).map(|list| {
            list.tasks
                .iter()
                .filter(|task| task.id != excluding)
                .map(|task| task.position)
                .collect()
        })
    }

    pub fn task_count(&self) -> usize {
        self.lists.iter().map(|list| list.tasks.len()).sum()
    }

    /// True when lists and every list's tasks are in position order.
    pub fn is_settled(&self) -> bool {
        is_sorted_by_position(&self.lists)
            && self
                .lists
                .iter()
                .all(|list| is_sorted_by_position(&list.tasks))
    }

    fn list_index(&self, list_id: ListId) -> Option<usize> {
        self.lists.iter().position(|list| list.id == list_id)
    }

    fn list_mut(&mut self, list_id: ListId) -> Option<&mut List> {
        self.lists.iter_mut().find(|list| list.id == list_id)
    }
}
