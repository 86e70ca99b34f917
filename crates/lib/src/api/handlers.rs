use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use super::{ActingUser, ApiError, ApiJson, ApiPath, ApiQuery, AppState};
use crate::{
    model::{ActivityEntry, Board, BoardId, List, ListId, Member, Task, TaskId, UserId},
    protocol::{
        AddMemberRequest, BoardSnapshot, CreateBoardRequest, CreateListRequest,
        CreateTaskRequest, HealthResponse, MoveListRequest, MoveRequest, TaskPatch,
        UpdateListRequest,
    },
};

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Health
// ============================================================================

/// Handler for GET /health
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// ============================================================================
// Boards
// ============================================================================

/// Handler for GET /api/boards
pub(super) async fn list_boards(
    State(state): State<AppState>,
    user: ActingUser,
) -> Json<Vec<Board>> {
    Json(state.service.list_boards(user.id).await)
}

/// Handler for POST /api/boards
pub(super) async fn create_board(
    State(state): State<AppState>,
    user: ActingUser,
    ApiJson(request): ApiJson<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let board = state.service.create_board(user.summary(), request).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// Handler for GET /api/boards/{id}
pub(super) async fn get_board(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(board_id): ApiPath<BoardId>,
) -> ApiResult<Json<BoardSnapshot>> {
    Ok(Json(state.service.board_snapshot(user.id, board_id).await?))
}

/// Handler for PUT /api/boards/{id}
pub(super) async fn rename_board(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(board_id): ApiPath<BoardId>,
    ApiJson(request): ApiJson<CreateBoardRequest>,
) -> ApiResult<Json<Board>> {
    Ok(Json(
        state.service.rename_board(user.id, board_id, request).await?,
    ))
}

/// Handler for DELETE /api/boards/{id}
pub(super) async fn delete_board(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(board_id): ApiPath<BoardId>,
) -> ApiResult<StatusCode> {
    state.service.delete_board(user.id, board_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityQuery {
    limit: Option<usize>,
}

/// Handler for GET /api/boards/{id}/activity
pub(super) async fn board_activity(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(board_id): ApiPath<BoardId>,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    Ok(Json(
        state
            .service
            .board_activity(user.id, board_id, query.limit)
            .await?,
    ))
}

/// Handler for GET /api/activity/recent
///
/// Activity across every board the user belongs to.
pub(super) async fn recent_activity(
    State(state): State<AppState>,
    user: ActingUser,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> Json<Vec<ActivityEntry>> {
    Json(state.service.recent_activity(user.id, query.limit).await)
}

/// Handler for POST /api/boards/{id}/members
pub(super) async fn add_member(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(board_id): ApiPath<BoardId>,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let member = state.service.add_member(user.id, board_id, request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Handler for DELETE /api/boards/{id}/members/{user_id}
pub(super) async fn remove_member(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath((board_id, member_id)): ApiPath<(BoardId, UserId)>,
) -> ApiResult<StatusCode> {
    state
        .service
        .remove_member(user.id, board_id, member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Lists
// ============================================================================

/// Handler for POST /api/lists
pub(super) async fn create_list(
    State(state): State<AppState>,
    user: ActingUser,
    ApiJson(request): ApiJson<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let list = state.service.create_list(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Handler for PUT /api/lists/{id}
pub(super) async fn rename_list(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(list_id): ApiPath<ListId>,
    ApiJson(request): ApiJson<UpdateListRequest>,
) -> ApiResult<Json<List>> {
    Ok(Json(
        state.service.rename_list(user.id, list_id, request).await?,
    ))
}

/// Handler for PUT /api/lists/{id}/move
pub(super) async fn move_list(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(list_id): ApiPath<ListId>,
    ApiJson(request): ApiJson<MoveListRequest>,
) -> ApiResult<Json<List>> {
    Ok(Json(
        state.service.move_list(user.id, list_id, request).await?,
    ))
}

/// Handler for DELETE /api/lists/{id}
pub(super) async fn delete_list(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(list_id): ApiPath<ListId>,
) -> ApiResult<StatusCode> {
    state.service.delete_list(user.id, list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tasks
// ============================================================================

/// Handler for POST /api/tasks
pub(super) async fn create_task(
    State(state): State<AppState>,
    user: ActingUser,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.service.create_task(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /api/tasks/{id}
pub(super) async fn update_task(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(task_id): ApiPath<TaskId>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        state.service.update_task(user.id, task_id, patch).await?,
    ))
}

/// Handler for PUT /api/tasks/{id}/move
pub(super) async fn move_task(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(task_id): ApiPath<TaskId>,
    ApiJson(request): ApiJson<MoveRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        state.service.move_task(user.id, task_id, request).await?,
    ))
}

/// Handler for DELETE /api/tasks/{id}
pub(super) async fn delete_task(
    State(state): State<AppState>,
    user: ActingUser,
    ApiPath(task_id): ApiPath<TaskId>,
) -> ApiResult<StatusCode> {
    state.service.delete_task(user.id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
