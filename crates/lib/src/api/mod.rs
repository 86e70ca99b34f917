//! HTTP and websocket surface of the board service.
//!
//! [`router`] builds the axum application. Every `/api` route and `/ws`
//! requires an acting user (see [`ActingUser`]); `/health` does not.

mod errors;
mod extract;
mod handlers;
mod ws;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::service::BoardService;

pub use errors::ApiError;
pub use extract::{ActingUser, ApiJson, ApiPath, ApiQuery};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: BoardService,
}

/// Build the application router over `service`.
pub fn router(service: BoardService) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/boards",
            get(handlers::list_boards).post(handlers::create_board),
        )
        .route(
            "/api/boards/{id}",
            get(handlers::get_board)
                .put(handlers::rename_board)
                .delete(handlers::delete_board),
        )
        .route("/api/boards/{id}/activity", get(handlers::board_activity))
        .route("/api/activity/recent", get(handlers::recent_activity))
        .route("/api/boards/{id}/members", post(handlers::add_member))
        .route(
            "/api/boards/{id}/members/{user_id}",
            axum::routing::delete(handlers::remove_member),
        )
        .route("/api/lists", post(handlers::create_list))
        .route(
            "/api/lists/{id}",
            put(handlers::rename_list).delete(handlers::delete_list),
        )
        .route("/api/lists/{id}/move", put(handlers::move_list))
        .route("/api/tasks", post(handlers::create_task))
        .route(
            "/api/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/move", put(handlers::move_task))
        .route("/ws", get(ws::upgrade))
        .with_state(AppState { service })
}
