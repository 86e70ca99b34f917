//! Websocket rooms and event fan-out.

use std::time::Duration;

use boardsync::{
    Error,
    client::{ClientError, EventStream},
    model::{BoardId, UserId},
    position::BASE_GAP,
    protocol::{BoardEvent, ClientMessage, ServerMessage},
    reconcile::{Outcome, Reconciler},
};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::helpers::*;

#[tokio::test]
async fn created_task_reaches_the_other_client() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;

    let mut view_b = member.fetch_view(fx.board.id).await.unwrap();
    let mut stream_b = fx.server.stream(member.user(), fx.board.id).await;

    let task = fx.owner.create_task(fx.todo.id, "from A").await.unwrap();

    let event = next_event(&mut stream_b).await;
    assert_eq!(event, BoardEvent::TaskCreated(task.clone()));

    let mut reconciler = Reconciler::new();
    assert_eq!(
        reconciler.apply(&mut view_b, &event).unwrap(),
        Outcome::Applied
    );
    assert_eq!(view_b.task(task.id), Some(&task));
}

#[tokio::test]
async fn originator_receives_its_own_echo() {
    let fx = setup_board().await;
    let mut view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let mut stream = fx.server.stream(fx.owner.user(), fx.board.id).await;

    let task = fx.owner.create_task(fx.todo.id, "mine").await.unwrap();
    // The caller applies its own response first
    view.apply_authoritative(task.clone()).unwrap();

    let echo = next_event(&mut stream).await;
    let mut reconciler = Reconciler::new();
    assert_eq!(
        reconciler.apply(&mut view, &echo).unwrap(),
        Outcome::Unchanged
    );
    assert_eq!(view.task_ids(fx.todo.id), vec![task.id]);
}

#[tokio::test]
async fn moves_are_seen_by_every_subscriber() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let task = fx.owner.create_task(fx.todo.id, "travel").await.unwrap();

    let mut stream_a = fx.server.stream(fx.owner.user(), fx.board.id).await;
    let mut stream_b = fx.server.stream(member.user(), fx.board.id).await;

    let moved = member
        .move_task_to(task.id, fx.done.id, BASE_GAP)
        .await
        .unwrap();

    for stream in [&mut stream_a, &mut stream_b] {
        assert_eq!(
            next_event(stream).await,
            BoardEvent::TaskMoved(moved.clone())
        );
    }
}

#[tokio::test]
async fn rebalance_publishes_renumbered_siblings_first() {
    let fx = setup_board().await;
    let a = fx.owner.create_task(fx.todo.id, "a").await.unwrap();
    let b = fx.owner.create_task(fx.todo.id, "b").await.unwrap();
    let c = fx.owner.create_task(fx.done.id, "c").await.unwrap();

    // Squeeze b right behind a, so the next slot between them is exhausted
    let mut squeezed = b.clone();
    squeezed.position = a.position + 1e-7;
    fx.server.service.storage().put_task(squeezed).await;

    let mut stream = fx.server.stream(fx.owner.user(), fx.board.id).await;
    let moved = fx
        .owner
        .move_task_to(c.id, fx.todo.id, a.position + 5e-8)
        .await
        .unwrap();

    let events = events_until(&mut stream, |event| {
        matches!(event, BoardEvent::TaskMoved(task) if task.id == c.id)
    })
    .await;
    let moved_ids: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BoardEvent::TaskMoved(task) => Some(task.id),
            _ => None,
        })
        .collect();
    assert_eq!(moved_ids, vec![b.id, c.id]);

    let view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    assert_eq!(view.task_ids(fx.todo.id), vec![a.id, c.id, b.id]);
    assert_eq!(view.task(c.id).unwrap().position, moved.position);
}

#[tokio::test]
async fn switching_boards_stops_old_events() {
    let fx = setup_board().await;
    let second = fx.owner.create_board("Second").await.unwrap();
    let second_list = fx.owner.create_list(second.id, "Inbox").await.unwrap();

    let mut stream = fx.server.stream(fx.owner.user(), fx.board.id).await;
    stream.join(second.id).await.unwrap();
    assert_eq!(stream.board_id(), Some(second.id));

    fx.owner.create_task(fx.todo.id, "first board").await.unwrap();
    let task = fx
        .owner
        .create_task(second_list.id, "second board")
        .await
        .unwrap();

    assert_eq!(next_event(&mut stream).await, BoardEvent::TaskCreated(task));
}

#[tokio::test]
async fn joining_requires_membership() {
    let fx = setup_board().await;
    let mut stream = EventStream::connect(&fx.server.base_url, UserId::new())
        .await
        .unwrap();
    let err = stream.join(fx.board.id).await.unwrap_err();
    assert!(err.is_client_error());

    // The socket stays usable after a refused join
    let mut stream = EventStream::connect(&fx.server.base_url, fx.owner.user())
        .await
        .unwrap();
    assert!(stream.join(BoardId::new()).await.is_err());
    stream.join(fx.board.id).await.unwrap();
}

#[tokio::test]
async fn malformed_frames_get_an_error_reply() {
    let fx = setup_board().await;
    let url = format!(
        "{}/ws?userId={}",
        fx.server.base_url.replacen("http", "ws", 1),
        fx.owner.user()
    );
    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();

    socket.send(Message::text("{\"type\":\"dance\"}")).await.unwrap();
    let reply = socket.next().await.unwrap().unwrap();
    let message: ServerMessage = serde_json::from_str(reply.to_text().unwrap()).unwrap();
    assert!(matches!(message, ServerMessage::Error { .. }));

    let join = serde_json::to_string(&ClientMessage::JoinBoard {
        board_id: fx.board.id,
    })
    .unwrap();
    socket.send(Message::text(join)).await.unwrap();
    let reply = socket.next().await.unwrap().unwrap();
    let message: ServerMessage = serde_json::from_str(reply.to_text().unwrap()).unwrap();
    assert_eq!(
        message,
        ServerMessage::Joined {
            board_id: fx.board.id
        }
    );
}

#[tokio::test]
async fn closed_sockets_release_their_rooms() {
    let fx = setup_board().await;
    let stream = fx.server.stream(fx.owner.user(), fx.board.id).await;
    assert_eq!(fx.server.service.hub().subscriber_count(fx.board.id).await, 1);

    stream.close().await.unwrap();
    let hub = fx.server.service.hub();
    for _ in 0..50 {
        if hub.room_count().await == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(hub.room_count().await, 0);
}

#[tokio::test]
async fn removed_member_stops_receiving_events() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let mut owner_stream = fx.server.stream(fx.owner.user(), fx.board.id).await;
    let mut member_stream = fx.server.stream(member.user(), fx.board.id).await;

    fx.owner
        .remove_member(fx.board.id, member.user())
        .await
        .unwrap();
    let task = fx.owner.create_task(fx.todo.id, "secret").await.unwrap();

    // The removal itself is still delivered, then the room is left
    assert_eq!(
        next_event(&mut member_stream).await,
        BoardEvent::MemberRemoved {
            user_id: member.user()
        }
    );
    let err = member_stream.next_event().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Client(ClientError::Left { board_id, .. }) if board_id == fx.board.id
    ));
    assert_eq!(member_stream.board_id(), None);

    let events = events_until(&mut owner_stream, |event| {
        matches!(event, BoardEvent::TaskCreated(created) if created.id == task.id)
    })
    .await;
    assert_eq!(events.len(), 2);
    let silent =
        tokio::time::timeout(Duration::from_millis(200), member_stream.next_message()).await;
    assert!(silent.is_err(), "no frames after leaving");
    assert_eq!(fx.server.service.hub().subscriber_count(fx.board.id).await, 1);
}

#[tokio::test]
async fn deleting_a_board_releases_its_subscribers() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let mut stream = fx.server.stream(member.user(), fx.board.id).await;

    fx.owner.delete_board(fx.board.id).await.unwrap();

    let err = stream.next_event().await.unwrap_err();
    assert!(matches!(err, Error::Client(ClientError::Left { .. })));
    assert_eq!(stream.board_id(), None);
    assert_eq!(fx.server.service.hub().room_count().await, 0);

    // The board cannot be joined again
    assert!(stream.join(fx.board.id).await.is_err());
}
