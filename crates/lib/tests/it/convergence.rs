//! Views fed only by events converge to the server's state.

use boardsync::{
    model::Priority,
    position::BASE_GAP,
    protocol::{AddMemberRequest, BoardEvent, TaskPatch},
    reconcile::Reconciler,
};

use crate::helpers::*;

#[tokio::test]
async fn event_fed_view_matches_fresh_fetch() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;

    let mut view = member.fetch_view(fx.board.id).await.unwrap();
    let mut stream = fx.server.stream(member.user(), fx.board.id).await;
    let mut reconciler = Reconciler::new();

    // A mix of writes from both users
    let a = fx.owner.create_task(fx.todo.id, "a").await.unwrap();
    let b = member.create_task(fx.todo.id, "b").await.unwrap();
    let c = fx.owner.create_task(fx.todo.id, "c").await.unwrap();
    member
        .move_task_to(c.id, fx.todo.id, a.position / 2.0)
        .await
        .unwrap();
    fx.owner
        .move_task_to(a.id, fx.done.id, BASE_GAP)
        .await
        .unwrap();
    fx.owner
        .update_task(
            b.id,
            &TaskPatch {
                priority: Some(Priority::Urgent),
                description: Some("needs review".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let review = fx.owner.create_list(fx.board.id, "Review").await.unwrap();
    fx.owner.rename_list(review.id, "QA").await.unwrap();
    member.delete_task(b.id).await.unwrap();
    let newcomer = fx.server.client("Sam");
    fx.owner
        .add_member(
            fx.board.id,
            &AddMemberRequest {
                user_id: newcomer.user(),
                name: "Sam".into(),
                email: Some("sam@example.com".into()),
            },
        )
        .await
        .unwrap();
    fx.owner.delete_list(review.id).await.unwrap();

    let events = events_until(&mut stream, |event| {
        matches!(event, BoardEvent::ListDeleted { list_id } if *list_id == review.id)
    })
    .await;
    let stats = reconciler.apply_all(&mut view, &events);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.total(), events.len());

    assert!(view.is_settled());
    assert_eq!(view, member.fetch_view(fx.board.id).await.unwrap());
    assert_eq!(view.task_ids(fx.todo.id), vec![c.id]);
    assert_eq!(view.task_ids(fx.done.id), vec![a.id]);
    assert_eq!(view.members().len(), 3);
}

#[tokio::test]
async fn replaying_events_changes_nothing() {
    let fx = setup_board().await;
    let mut view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    let mut stream = fx.server.stream(fx.owner.user(), fx.board.id).await;

    let task = fx.owner.create_task(fx.todo.id, "once").await.unwrap();
    fx.owner
        .move_task_to(task.id, fx.done.id, BASE_GAP)
        .await
        .unwrap();
    fx.owner.delete_task(task.id).await.unwrap();

    let events = events_until(&mut stream, |event| {
        matches!(event, BoardEvent::TaskDeleted { .. })
    })
    .await;
    let mut reconciler = Reconciler::new();
    reconciler.apply_all(&mut view, &events);
    let settled = view.clone();

    // Replaying the whole sequence in order lands in the same place
    let replay = reconciler.apply_all(&mut view, &events);
    assert_eq!(view, settled);
    assert_eq!(replay.rejected, 0);
    assert!(view.task(task.id).is_none());
    assert_eq!(reconciler.stats().total(), 2 * events.len());
}
