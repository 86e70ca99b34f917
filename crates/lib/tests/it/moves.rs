//! Optimistic moves through `MoveCoordinator` against a live server.

use boardsync::{
    coordinator::{DropTarget, MoveCoordinator},
    model::Task,
    position::BASE_GAP,
};

use crate::helpers::*;

async fn seed(fx: &BoardFixture, titles: &[&str]) -> Vec<Task> {
    let mut tasks = Vec::new();
    for title in titles {
        tasks.push(fx.owner.create_task(fx.todo.id, title).await.unwrap());
    }
    tasks
}

#[tokio::test]
async fn confirmed_move_keeps_the_optimistic_order() {
    let fx = setup_board().await;
    let tasks = seed(&fx, &["a", "b", "c"]).await;
    let mut view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let mut coordinator = MoveCoordinator::new(fx.owner.clone());

    coordinator.drag_start(&view, tasks[2].id).unwrap();
    coordinator.drag_over(&view, DropTarget::Task(tasks[0].id));
    let pending = coordinator.drop(&mut view).unwrap().unwrap();
    let optimistic = view.task_ids(fx.todo.id);
    assert_eq!(optimistic, vec![tasks[2].id, tasks[0].id, tasks[1].id]);

    let confirmed = coordinator.commit(&mut view, pending).await.unwrap();
    assert_eq!(confirmed.position, 32768.0);
    assert_eq!(view.task_ids(fx.todo.id), optimistic);
    assert_eq!(
        view,
        fx.owner.fetch_view(fx.board.id).await.unwrap(),
        "the local view matches a fresh fetch"
    );
}

#[tokio::test]
async fn move_to_another_list_tail() {
    let fx = setup_board().await;
    let tasks = seed(&fx, &["a", "b"]).await;
    let shipped = fx.owner.create_task(fx.done.id, "shipped").await.unwrap();
    let mut view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let mut coordinator = MoveCoordinator::new(fx.owner.clone());

    coordinator.drag_start(&view, tasks[0].id).unwrap();
    coordinator.drag_over(&view, DropTarget::List(fx.done.id));
    let confirmed = coordinator
        .drop_and_commit(&mut view)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(confirmed.list_id, fx.done.id);
    assert_eq!(confirmed.position, shipped.position + BASE_GAP);
    assert_eq!(view.task_ids(fx.todo.id), vec![tasks[1].id]);
    assert_eq!(view.task_ids(fx.done.id), vec![shipped.id, tasks[0].id]);
}

#[tokio::test]
async fn rejected_move_is_rolled_back() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let tasks = seed(&fx, &["a", "b", "c"]).await;
    let mut view = member.fetch_view(fx.board.id).await.unwrap();
    let before = view.clone();

    // The member loses access between rendering and dropping
    fx.owner
        .remove_member(fx.board.id, member.user())
        .await
        .unwrap();

    let mut coordinator = MoveCoordinator::new(member.clone());
    coordinator.drag_start(&view, tasks[1].id).unwrap();
    coordinator.drag_over(&view, DropTarget::List(fx.done.id));
    let err = coordinator.drop_and_commit(&mut view).await.unwrap_err();

    assert!(err.is_permission_denied());
    assert_eq!(view, before);
}

#[tokio::test]
async fn concurrent_moves_into_one_list_get_distinct_positions() {
    let fx = setup_board().await;
    let tasks = seed(&fx, &["a", "b", "c", "d", "e", "f"]).await;
    let anchor = fx.owner.create_task(fx.done.id, "anchor").await.unwrap();

    // Every client proposes the same slot right after the anchor
    let mut handles = Vec::new();
    for task in &tasks {
        let client = fx.owner.clone();
        let task_id = task.id;
        let list_id = fx.done.id;
        let proposal = anchor.position + BASE_GAP;
        handles.push(tokio::spawn(async move {
            client.move_task_to(task_id, list_id, proposal).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let done = view.list(fx.done.id).unwrap();
    assert_eq!(done.tasks.len(), tasks.len() + 1);
    assert!(
        done.tasks
            .windows(2)
            .all(|pair| pair[0].position < pair[1].position),
        "positions are strictly increasing"
    );
    assert!(view.task_ids(fx.todo.id).is_empty());
}

#[tokio::test]
async fn cancelled_drag_sends_nothing() {
    let fx = setup_board().await;
    let tasks = seed(&fx, &["a", "b"]).await;
    let mut view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let before = view.clone();
    let mut coordinator = MoveCoordinator::new(fx.owner.clone());

    coordinator.drag_start(&view, tasks[0].id).unwrap();
    coordinator.drag_over(&view, DropTarget::List(fx.done.id));
    assert!(coordinator.cancel().is_some());
    assert!(coordinator.drop_and_commit(&mut view).await.unwrap().is_none());

    assert_eq!(view, before);
    let activity = fx.owner.board_activity(fx.board.id, Some(1)).await.unwrap();
    assert_eq!(activity[0].task_id, Some(tasks[1].id));
}
