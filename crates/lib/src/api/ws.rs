//! The `/ws` endpoint: one socket, at most one joined board at a time.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{debug, info, warn};

use super::{ActingUser, AppState};
use crate::{
    hub::Subscription,
    model::{BoardId, UserId},
    protocol::{BoardEvent, ClientMessage, ServerMessage},
};

/// Handler for GET /ws
pub(super) async fn upgrade(
    State(state): State<AppState>,
    user: ActingUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, state, user.id))
}

async fn run_socket(mut socket: WebSocket, state: AppState, user: UserId) {
    info!(%user, "websocket connected");
    let mut room: Option<Subscription> = None;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(%user, error = %e, "websocket receive failed");
                        break;
                    }
                };
                let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => handle_message(&state, user, message, &mut room).await,
                    Err(e) => Some(ServerMessage::Error {
                        message: format!("Invalid message: {e}"),
                    }),
                };
                if let Some(reply) = reply {
                    if send(&mut socket, &reply).await.is_err() {
                        break;
                    }
                }
            }
            event = next_event(&mut room) => {
                let Some((board_id, event)) = event else {
                    // The room was closed: the board is gone
                    let Some(left) = room.take() else { continue };
                    let frame = ServerMessage::Left {
                        board_id: left.board_id(),
                        reason: "Board was deleted".to_string(),
                    };
                    info!(%user, board_id = %left.board_id(), "board deleted, left room");
                    if send(&mut socket, &frame).await.is_err() {
                        break;
                    }
                    continue;
                };
                let removed = matches!(
                    *event,
                    BoardEvent::MemberRemoved { user_id } if user_id == user
                );
                let frame = ServerMessage::Event {
                    board_id,
                    event: (*event).clone(),
                };
                if send(&mut socket, &frame).await.is_err() {
                    break;
                }
                if removed {
                    room = None;
                    state.service.hub().prune().await;
                    info!(%user, %board_id, "removed from board, left room");
                    let frame = ServerMessage::Left {
                        board_id,
                        reason: "Removed from board".to_string(),
                    };
                    if send(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(room);
    let pruned = state.service.hub().prune().await;
    info!(%user, pruned, "websocket disconnected");
}

async fn handle_message(
    state: &AppState,
    user: UserId,
    message: ClientMessage,
    room: &mut Option<Subscription>,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::JoinBoard { board_id } => {
            if let Err(e) = state.service.ensure_member(board_id, user).await {
                warn!(%user, %board_id, error = %e, "join refused");
                return Some(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
            let subscription = state.service.hub().join(board_id).await;
            if let Some(left) = room.replace(subscription) {
                drop(left);
                state.service.hub().prune().await;
            }
            debug!(%user, %board_id, "joined board room");
            Some(ServerMessage::Joined { board_id })
        }
        ClientMessage::LeaveBoard => {
            if let Some(left) = room.take() {
                debug!(%user, board_id = %left.board_id(), "left board room");
                drop(left);
                state.service.hub().prune().await;
            }
            None
        }
    }
}

/// The next event of the joined room. Pending forever while no room is joined.
async fn next_event(room: &mut Option<Subscription>) -> Option<(BoardId, Arc<BoardEvent>)> {
    match room {
        Some(subscription) => {
            let board_id = subscription.board_id();
            subscription.recv().await.map(|event| (board_id, event))
        }
        None => std::future::pending().await,
    }
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to encode server message");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
