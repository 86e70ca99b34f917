//! Merging real-time events into a client view.
//!
//! Entity-bearing events go through the idempotent upsert paths of
//! [`BoardView`], deletions through unconditional removal. Echoes of the
//! client's own changes therefore land as [`Outcome::Unchanged`]. When two
//! updates to the same task race, whichever is applied last wins.

use tracing::{debug, warn};

use crate::{
    Error, Result,
    protocol::BoardEvent,
    view::{BoardView, Upsert, ViewError},
};

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The view changed.
    Applied,
    /// The view already reflected the event.
    Unchanged,
    /// The event refers to a list this view does not hold.
    Ignored,
}

impl From<Upsert> for Outcome {
    fn from(upsert: Upsert) -> Self {
        match upsert {
            Upsert::Inserted | Upsert::Replaced => Outcome::Applied,
            Upsert::Unchanged => Outcome::Unchanged,
        }
    }
}

impl From<bool> for Outcome {
    fn from(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

/// Running totals of applied events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub applied: usize,
    pub unchanged: usize,
    pub ignored: usize,
    /// Events whose payload failed validation.
    pub rejected: usize,
}

impl ReconcileStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Ignored => self.ignored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.applied + self.unchanged + self.ignored + self.rejected
    }
}

/// Applies incoming events to a view and keeps count.
#[derive(Debug, Default)]
pub struct Reconciler {
    stats: ReconcileStats,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Apply one event. Invalid payloads are rejected before the view is
    /// touched.
    pub fn apply(&mut self, view: &mut BoardView, event: &BoardEvent) -> Result<Outcome> {
        match apply_event(view, event) {
            Ok(outcome) => {
                debug!(event = event.name(), ?outcome, "reconciled event");
                self.stats.record(outcome);
                Ok(outcome)
            }
            Err(err) => {
                self.stats.rejected += 1;
                Err(err)
            }
        }
    }

    /// Apply a batch, skipping (and logging) events that fail validation.
    pub fn apply_all<'a, I>(&mut self, view: &mut BoardView, events: I) -> ReconcileStats
    where
        I: IntoIterator<Item = &'a BoardEvent>,
    {
        let mut batch = ReconcileStats::default();
        for event in events {
            match self.apply(view, event) {
                Ok(outcome) => batch.record(outcome),
                Err(err) => {
                    warn!(event = event.name(), error = %err, "rejected event payload");
                    batch.rejected += 1;
                }
            }
        }
        batch
    }
}

fn apply_event(view: &mut BoardView, event: &BoardEvent) -> Result<Outcome> {
    let outcome = match event {
        BoardEvent::ListCreated(list) => view.insert_list(list.clone())?.into(),
        BoardEvent::ListUpdated(list) => view.update_list(list.clone())?.into(),
        BoardEvent::ListDeleted { list_id } => view.remove_list(*list_id).into(),
        BoardEvent::TaskCreated(task)
        | BoardEvent::TaskUpdated(task)
        | BoardEvent::TaskMoved(task) => match view.apply_authoritative(task.clone()) {
            Ok(upsert) => upsert.into(),
            Err(Error::View(ViewError::UnknownList { .. })) => Outcome::Ignored,
            Err(err) => return Err(err),
        },
        BoardEvent::TaskDeleted { task_id } => view.remove_task(*task_id).into(),
        BoardEvent::MemberAdded(member) => view.upsert_member(member.clone()).into(),
        BoardEvent::MemberRemoved { user_id } => view.remove_member(*user_id).into(),
    };
    Ok(outcome)
}
