//! REST surface tests against a live server.

use boardsync::{
    client::HttpClient,
    model::{ActivityAction, BoardId, Priority, Role, TaskId, UserId},
    position::BASE_GAP,
    protocol::{AddMemberRequest, TaskPatch},
};

use crate::helpers::*;

#[tokio::test]
async fn health_reports_healthy() {
    let server = TestServer::start().await;
    let health = server.client("Anyone").health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn created_board_lists_owner_as_admin() {
    let fx = setup_board().await;
    let snapshot = fx.owner.board_snapshot(fx.board.id).await.unwrap();

    assert_eq!(snapshot.board, fx.board);
    assert_eq!(snapshot.members.len(), 1);
    assert_eq!(snapshot.members[0].user.id, fx.owner.user());
    assert_eq!(snapshot.members[0].user.name, "Owner");
    assert_eq!(snapshot.members[0].role, Role::Admin);

    let titles: Vec<&str> = snapshot.lists.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["To Do", "Done"]);

    let boards = fx.owner.list_boards().await.unwrap();
    assert_eq!(boards, vec![fx.board.clone()]);
}

#[tokio::test]
async fn sequential_appends_use_the_base_gap() {
    let fx = setup_board().await;
    let first = fx.owner.create_task(fx.todo.id, "first").await.unwrap();
    let second = fx.owner.create_task(fx.todo.id, "second").await.unwrap();
    assert_eq!(first.position, BASE_GAP);
    assert_eq!(second.position, 2.0 * BASE_GAP);
    assert_eq!(first.assignees[0].id, fx.owner.user());
}

#[tokio::test]
async fn moving_last_task_to_head_halves_the_first_position() {
    let fx = setup_board().await;
    let mut tasks = Vec::new();
    for title in ["a", "b", "c"] {
        tasks.push(fx.owner.create_task(fx.todo.id, title).await.unwrap());
    }

    let moved = fx
        .owner
        .move_task_to(tasks[2].id, fx.todo.id, BASE_GAP / 2.0)
        .await
        .unwrap();
    assert_eq!(moved.position, 32768.0);

    let view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    assert_eq!(
        view.task_ids(fx.todo.id),
        vec![tasks[2].id, tasks[0].id, tasks[1].id]
    );
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let server = TestServer::start().await;
    let response = reqwest::Client::new()
        .get(format!("{}/api/boards", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let fx = setup_board().await;
    let stranger = fx.server.client("Stranger");

    // Not a member
    let err = stranger.board_snapshot(fx.board.id).await.unwrap_err();
    assert!(err.is_permission_denied());

    // Unknown board
    let err = fx.owner.board_snapshot(BoardId::new()).await.unwrap_err();
    assert!(err.is_not_found());

    // Empty title
    let err = fx.owner.create_task(fx.todo.id, "   ").await.unwrap_err();
    assert!(err.is_validation_error());

    // Duplicate member
    let err = fx
        .owner
        .add_member(
            fx.board.id,
            &AddMemberRequest {
                user_id: fx.owner.user(),
                name: "Owner".into(),
                email: None,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let fx = setup_board().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/tasks", fx.server.base_url))
        .header("x-user-id", fx.owner.user().to_string())
        .header("content-type", "application/json")
        .body(r#"{"listId": "not-a-uuid"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_path_and_query_are_json_bad_requests() {
    let fx = setup_board().await;
    let http = reqwest::Client::new();
    let urls = [
        format!("{}/api/boards/not-a-uuid", fx.server.base_url),
        format!("{}/api/tasks/42/move", fx.server.base_url),
        format!(
            "{}/api/boards/{}/activity?limit=lots",
            fx.server.base_url, fx.board.id
        ),
        format!("{}/api/activity/recent?limit=-1", fx.server.base_url),
    ];
    for url in urls {
        let request = if url.contains("/move") {
            http.put(&url).json(&serde_json::json!({}))
        } else {
            http.get(&url)
        };
        let response = request
            .header("x-user-id", fx.owner.user().to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "{url}");
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "{url}");
    }
}

#[tokio::test]
async fn cross_board_move_is_rejected() {
    let fx = setup_board().await;
    let other_board = fx.owner.create_board("Other").await.unwrap();
    let foreign = fx
        .owner
        .create_list(other_board.id, "Elsewhere")
        .await
        .unwrap();
    let task = fx.owner.create_task(fx.todo.id, "stay").await.unwrap();

    let err = fx
        .owner
        .move_task_to(task.id, foreign.id, BASE_GAP)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let view = fx.owner.fetch_view(fx.board.id).await.unwrap();
    assert_eq!(view.task_ids(fx.todo.id), vec![task.id]);
}

#[tokio::test]
async fn member_rules_are_enforced() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;

    // Members can work on tasks but cannot delete lists
    let task = member.create_task(fx.todo.id, "from Lin").await.unwrap();
    let err = member.delete_list(fx.done.id).await.unwrap_err();
    assert!(err.is_permission_denied());

    // The owner cannot be removed, and admins cannot remove themselves
    let err = fx
        .owner
        .remove_member(fx.board.id, fx.owner.user())
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    fx.owner
        .remove_member(fx.board.id, member.user())
        .await
        .unwrap();
    let err = member.delete_task(task.id).await.unwrap_err();
    assert!(err.is_permission_denied());

    let err = fx
        .owner
        .remove_member(fx.board.id, UserId::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn task_patch_updates_fields() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let task = fx.owner.create_task(fx.todo.id, "draft").await.unwrap();

    let patch = TaskPatch {
        title: Some("final".into()),
        priority: Some(Priority::High),
        assignee_ids: Some(vec![member.user(), member.user()]),
        ..Default::default()
    };
    let updated = fx.owner.update_task(task.id, &patch).await.unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.assignees.len(), 1);
    assert_eq!(updated.position, task.position);

    let err = fx
        .owner
        .update_task(task.id, &TaskPatch::default())
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let err = fx
        .owner
        .update_task(TaskId::new(), &patch)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn lists_can_be_renamed_reordered_and_deleted() {
    let fx = setup_board().await;
    fx.owner.create_task(fx.done.id, "shipped").await.unwrap();

    let renamed = fx.owner.rename_list(fx.todo.id, "Backlog").await.unwrap();
    assert_eq!(renamed.title, "Backlog");
    assert_eq!(renamed.position, fx.todo.position);

    let moved = fx.owner.move_list(fx.done.id, 0.0).await.unwrap();
    assert!(moved.position < fx.todo.position);
    let snapshot = fx.owner.board_snapshot(fx.board.id).await.unwrap();
    let order: Vec<_> = snapshot.lists.iter().map(|l| l.id).collect();
    assert_eq!(order, vec![fx.done.id, fx.todo.id]);

    fx.owner.delete_list(fx.done.id).await.unwrap();
    let snapshot = fx.owner.board_snapshot(fx.board.id).await.unwrap();
    assert_eq!(snapshot.lists.len(), 1);
    assert_eq!(fx.server.service.storage().stats().await.tasks, 0);
}

#[tokio::test]
async fn activity_is_newest_first_and_limited() {
    let fx = setup_board().await;
    let task = fx.owner.create_task(fx.todo.id, "track me").await.unwrap();
    fx.owner
        .move_task_to(task.id, fx.done.id, BASE_GAP)
        .await
        .unwrap();

    let recent = fx
        .owner
        .board_activity(fx.board.id, Some(2))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].action, ActivityAction::TaskMoved);
    assert_eq!(recent[0].task_id, Some(task.id));
    assert_eq!(recent[1].action, ActivityAction::TaskCreated);

    let everything = fx.owner.board_activity(fx.board.id, None).await.unwrap();
    assert_eq!(
        everything.last().map(|entry| entry.action),
        Some(ActivityAction::BoardCreated)
    );
}

#[tokio::test]
async fn recent_activity_spans_the_users_boards() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;
    let side = member.create_board("Side project").await.unwrap();
    let task = fx.owner.create_task(fx.todo.id, "shared").await.unwrap();

    let feed = member.recent_activity(None).await.unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].task_id, Some(task.id));
    assert_eq!(feed[1].board_id, side.id);
    assert_eq!(feed[1].action, ActivityAction::BoardCreated);
    assert_eq!(feed[2].action, ActivityAction::MemberAdded);

    let one = member.recent_activity(Some(1)).await.unwrap();
    assert_eq!(one.len(), 1);

    let owner_feed = fx.owner.recent_activity(Some(100)).await.unwrap();
    assert!(owner_feed.iter().all(|entry| entry.board_id == fx.board.id));

    let stranger = fx.server.client("Stranger");
    assert!(stranger.recent_activity(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_owner_deletes_a_board() {
    let fx = setup_board().await;
    let member = fx.member("Lin").await;

    let err = member.delete_board(fx.board.id).await.unwrap_err();
    assert!(err.is_permission_denied());

    fx.owner.delete_board(fx.board.id).await.unwrap();
    let err = fx.owner.board_snapshot(fx.board.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(fx.owner.list_boards().await.unwrap().is_empty());
}

#[tokio::test]
async fn acting_user_without_name_falls_back_to_id() {
    let server = TestServer::start().await;
    let anonymous = HttpClient::new(&server.base_url, UserId::new()).unwrap();
    let board = anonymous.create_board("Unnamed").await.unwrap();
    let snapshot = anonymous.board_snapshot(board.id).await.unwrap();
    assert_eq!(
        snapshot.members[0].user.name,
        anonymous.user().to_string()
    );
}
