use std::{sync::Arc, time::Duration};

use boardsync::{
    BoardService, FixedClock, api,
    client::{EventStream, HttpClient},
    hub::BoardHub,
    model::{Board, BoardId, List, UserId},
    protocol::{AddMemberRequest, BoardEvent},
    storage::Storage,
};
use tokio::{net::TcpListener, task::JoinHandle};

// Re-export tokio test macro for convenience
pub use tokio;

/// How long a test waits for an event before failing.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub service: BoardService,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let service = BoardService::with_clock(
            Storage::new(),
            BoardHub::new(),
            Arc::new(FixedClock::default()),
        );
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let app = api::router(service.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });
        Self {
            base_url: format!("http://{addr}"),
            service,
            handle,
        }
    }

    /// A REST client acting as a fresh user.
    pub fn client(&self, name: &str) -> HttpClient {
        HttpClient::new(&self.base_url, UserId::new())
            .expect("Failed to build client")
            .with_name(name)
    }

    /// An event stream for `user`, already joined to `board_id`.
    pub async fn stream(&self, user: UserId, board_id: BoardId) -> EventStream {
        let mut stream = EventStream::connect(&self.base_url, user)
            .await
            .expect("Failed to connect event stream");
        stream
            .join(board_id)
            .await
            .expect("Failed to join board room");
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A board with "To Do" and "Done" lists, owned by `owner`.
pub struct BoardFixture {
    pub server: TestServer,
    pub owner: HttpClient,
    pub board: Board,
    pub todo: List,
    pub done: List,
}

pub async fn setup_board() -> BoardFixture {
    let server = TestServer::start().await;
    let owner = server.client("Owner");
    let board = owner
        .create_board("Roadmap")
        .await
        .expect("Failed to create board");
    let todo = owner
        .create_list(board.id, "To Do")
        .await
        .expect("Failed to create list");
    let done = owner
        .create_list(board.id, "Done")
        .await
        .expect("Failed to create list");
    BoardFixture {
        server,
        owner,
        board,
        todo,
        done,
    }
}

impl BoardFixture {
    /// A new client that the owner has added as a regular member.
    pub async fn member(&self, name: &str) -> HttpClient {
        let client = self.server.client(name);
        self.owner
            .add_member(
                self.board.id,
                &AddMemberRequest {
                    user_id: client.user(),
                    name: name.to_string(),
                    email: None,
                },
            )
            .await
            .expect("Failed to add member");
        client
    }
}

/// Wait for the next event, failing the test on timeout or disconnect.
pub async fn next_event(stream: &mut EventStream) -> BoardEvent {
    tokio::time::timeout(EVENT_TIMEOUT, stream.next_event())
        .await
        .expect("Timed out waiting for event")
        .expect("Event stream failed")
        .expect("Event stream closed")
}

/// Collect events until `done` returns true for one of them.
pub async fn events_until(
    stream: &mut EventStream,
    mut done: impl FnMut(&BoardEvent) -> bool,
) -> Vec<BoardEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(stream).await;
        let finished = done(&event);
        events.push(event);
        if finished {
            return events;
        }
    }
}
