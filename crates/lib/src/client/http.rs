use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::ClientError;
use crate::{
    BoardView, Result,
    constants::{USER_HEADER, USER_NAME_HEADER},
    coordinator::MoveApi,
    model::{ActivityEntry, Board, BoardId, List, ListId, Member, Task, TaskId, UserId},
    protocol::{
        AddMemberRequest, BoardSnapshot, CreateBoardRequest, CreateListRequest,
        CreateTaskRequest, HealthResponse, MoveListRequest, MoveRequest, TaskPatch,
        UpdateListRequest,
    },
};

/// REST client acting as one user.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    user: UserId,
    name: Option<String>,
}

impl HttpClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str, user: UserId) -> Result<Self> {
        Self::with_http(reqwest::Client::new(), base_url, user)
    }

    /// Create a client that sends requests through an existing reqwest client.
    pub fn with_http(http: reqwest::Client, base_url: &str, user: UserId) -> Result<Self> {
        let base = Url::parse(base_url).map_err(ClientError::from)?;
        Ok(Self {
            http,
            base,
            user,
            name: None,
        })
    }

    /// Send `name` as the acting user's display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The same server as a different user.
    pub fn as_user(&self, user: UserId) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            user,
            name: None,
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/health")?;
        Ok(receive(self.http.get(url)).await?)
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>> {
        self.call(Method::GET, "/api/boards", None::<&()>).await
    }

    pub async fn create_board(&self, title: &str) -> Result<Board> {
        let body = CreateBoardRequest {
            title: title.to_string(),
        };
        self.call(Method::POST, "/api/boards", Some(&body)).await
    }

    pub async fn board_snapshot(&self, board_id: BoardId) -> Result<BoardSnapshot> {
        self.call(Method::GET, &format!("/api/boards/{board_id}"), None::<&()>)
            .await
    }

    /// Fetch a board and build a fresh view of it.
    pub async fn fetch_view(&self, board_id: BoardId) -> Result<BoardView> {
        let snapshot = self.board_snapshot(board_id).await?;
        BoardView::from_lists(snapshot.lists, snapshot.members)
    }

    pub async fn rename_board(&self, board_id: BoardId, title: &str) -> Result<Board> {
        let body = CreateBoardRequest {
            title: title.to_string(),
        };
        self.call(Method::PUT, &format!("/api/boards/{board_id}"), Some(&body))
            .await
    }

    pub async fn delete_board(&self, board_id: BoardId) -> Result<()> {
        self.call_empty(Method::DELETE, &format!("/api/boards/{board_id}"))
            .await
    }

    pub async fn board_activity(
        &self,
        board_id: BoardId,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityEntry>> {
        let path = match limit {
            Some(limit) => format!("/api/boards/{board_id}/activity?limit={limit}"),
            None => format!("/api/boards/{board_id}/activity"),
        };
        self.call(Method::GET, &path, None::<&()>).await
    }

    /// Recent activity across every board this user belongs to.
    pub async fn recent_activity(&self, limit: Option<usize>) -> Result<Vec<ActivityEntry>> {
        let path = match limit {
            Some(limit) => format!("/api/activity/recent?limit={limit}"),
            None => "/api/activity/recent".to_string(),
        };
        self.call(Method::GET, &path, None::<&()>).await
    }

    pub async fn add_member(&self, board_id: BoardId, request: &AddMemberRequest) -> Result<Member> {
        self.call(
            Method::POST,
            &format!("/api/boards/{board_id}/members"),
            Some(request),
        )
        .await
    }

    pub async fn remove_member(&self, board_id: BoardId, member: UserId) -> Result<()> {
        self.call_empty(
            Method::DELETE,
            &format!("/api/boards/{board_id}/members/{member}"),
        )
        .await
    }

    pub async fn create_list(&self, board_id: BoardId, title: &str) -> Result<List> {
        let body = CreateListRequest {
            board_id,
            title: title.to_string(),
        };
        self.call(Method::POST, "/api/lists", Some(&body)).await
    }

    pub async fn rename_list(&self, list_id: ListId, title: &str) -> Result<List> {
        let body = UpdateListRequest {
            title: title.to_string(),
        };
        self.call(Method::PUT, &format!("/api/lists/{list_id}"), Some(&body))
            .await
    }

    pub async fn move_list(&self, list_id: ListId, new_position: f64) -> Result<List> {
        let body = MoveListRequest { new_position };
        self.call(
            Method::PUT,
            &format!("/api/lists/{list_id}/move"),
            Some(&body),
        )
        .await
    }

    pub async fn delete_list(&self, list_id: ListId) -> Result<()> {
        self.call_empty(Method::DELETE, &format!("/api/lists/{list_id}"))
            .await
    }

    pub async fn create_task(&self, list_id: ListId, title: &str) -> Result<Task> {
        let body = CreateTaskRequest {
            list_id,
            title: title.to_string(),
        };
        self.call(Method::POST, "/api/tasks", Some(&body)).await
    }

    pub async fn update_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.call(Method::PUT, &format!("/api/tasks/{task_id}"), Some(patch))
            .await
    }

    /// Move a task without going through a [`crate::coordinator::MoveCoordinator`].
    pub async fn move_task_to(
        &self,
        task_id: TaskId,
        list_id: ListId,
        new_position: f64,
    ) -> Result<Task> {
        let request = MoveRequest {
            new_list_id: list_id,
            new_position,
        };
        self.move_task(task_id, request).await
    }

    pub async fn delete_task(&self, task_id: TaskId) -> Result<()> {
        self.call_empty(Method::DELETE, &format!("/api/tasks/{task_id}"))
            .await
    }

    fn url(&self, path: &str) -> std::result::Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> std::result::Result<RequestBuilder, ClientError> {
        let mut builder = self
            .http
            .request(method, self.url(path)?)
            .header(USER_HEADER, self.user.to_string());
        if let Some(name) = &self.name {
            builder = builder.header(USER_NAME_HEADER, name);
        }
        Ok(builder)
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, user = %self.user, "request");
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(receive(builder).await?)
    }

    async fn call_empty(&self, method: Method, path: &str) -> Result<()> {
        debug!(%method, path, user = %self.user, "request");
        let response = self.request(method, path)?.send().await.map_err(ClientError::from)?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl MoveApi for HttpClient {
    async fn move_task(&self, task_id: TaskId, request: MoveRequest) -> Result<Task> {
        self.call(
            Method::PUT,
            &format!("/api/tasks/{task_id}/move"),
            Some(&request),
        )
        .await
    }
}

async fn receive<T: DeserializeOwned>(builder: RequestBuilder) -> std::result::Result<T, ClientError> {
    let response = check_status(builder.send().await?).await?;
    Ok(response.json().await?)
}

/// Turn a non-success response into [`ClientError::Status`], using the
/// server's `{"error": ...}` body when there is one.
async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| fallback_message(status, text));
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

fn fallback_message(status: StatusCode, text: String) -> String {
    if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        text
    }
}
