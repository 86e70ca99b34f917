//! Per-board broadcast rooms.
//!
//! [`BoardHub`] is constructed once and cloned into whoever needs to publish
//! or subscribe. Each board gets a lazily created `tokio::sync::broadcast`
//! channel; every subscriber of a board receives every event published to it,
//! including the client whose request caused the event.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, trace, warn};

use crate::{constants::ROOM_CAPACITY, model::BoardId, protocol::BoardEvent};

type Room = broadcast::Sender<Arc<BoardEvent>>;

/// Registry of board rooms.
#[derive(Debug, Clone)]
pub struct BoardHub {
    rooms: Arc<RwLock<HashMap<BoardId, Room>>>,
    capacity: usize,
}

impl Default for BoardHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardHub {
    pub fn new() -> Self {
        Self::with_capacity(ROOM_CAPACITY)
    }

    /// Create a hub whose rooms buffer `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a board's room, creating it on first use.
    pub async fn join(&self, board_id: BoardId) -> Subscription {
        if let Some(room) = self.rooms.read().await.get(&board_id) {
            return Subscription::new(board_id, room.subscribe());
        }
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(board_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        debug!(%board_id, "joined board room");
        Subscription::new(board_id, room.subscribe())
    }

    /// Deliver an event to everyone in the board's room.
    ///
    /// Returns the number of subscribers reached; zero when nobody listens.
    pub async fn publish(&self, board_id: BoardId, event: BoardEvent) -> usize {
        let name = event.name();
        let rooms = self.rooms.read().await;
        let delivered = rooms
            .get(&board_id)
            .and_then(|room| room.send(Arc::new(event)).ok())
            .unwrap_or(0);
        trace!(%board_id, event = name, delivered, "published board event");
        delivered
    }

    /// Number of live subscribers in a board's room.
    pub async fn subscriber_count(&self, board_id: BoardId) -> usize {
        self.rooms
            .read()
            .await
            .get(&board_id)
            .map_or(0, |room| room.receiver_count())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Tear down a board's room. Subscribers drain what was already published
    /// and then see the room as gone.
    pub async fn close(&self, board_id: BoardId) -> bool {
        let closed = self.rooms.write().await.remove(&board_id).is_some();
        if closed {
            debug!(%board_id, "closed board room");
        }
        closed
    }

    /// Drop rooms nobody is subscribed to. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, room| room.receiver_count() > 0);
        let removed = before - rooms.len();
        if removed > 0 {
            debug!(removed, "pruned empty board rooms");
        }
        removed
    }
}

/// A receiver for one board's events.
#[derive(Debug)]
pub struct Subscription {
    board_id: BoardId,
    receiver: broadcast::Receiver<Arc<BoardEvent>>,
}

impl Subscription {
    fn new(board_id: BoardId, receiver: broadcast::Receiver<Arc<BoardEvent>>) -> Self {
        Self { board_id, receiver }
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Wait for the next event. Returns `None` once the room is gone.
    ///
    /// A subscriber that falls more than the room capacity behind skips the
    /// missed events; the client is expected to refetch the board.
    pub async fn recv(&mut self) -> Option<Arc<BoardEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(board_id = %self.board_id, skipped, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
