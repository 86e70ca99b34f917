use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use super::ClientError;
use crate::{
    Result,
    constants::USER_QUERY_PARAM,
    model::{BoardId, UserId},
    protocol::{BoardEvent, ClientMessage, ServerMessage},
};

/// A websocket subscription to board events.
pub struct EventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    board_id: Option<BoardId>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("board_id", &self.board_id)
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Open `/ws` on the server at `base_url` as `user`.
    pub async fn connect(base_url: &str, user: UserId) -> Result<Self> {
        let url = socket_url(base_url, user)?;
        debug!(%url, "connecting event stream");
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(ClientError::from)?;
        Ok(Self {
            socket,
            board_id: None,
        })
    }

    /// The board currently joined, if any.
    pub fn board_id(&self) -> Option<BoardId> {
        self.board_id
    }

    /// Join a board's room and wait for the server to confirm.
    ///
    /// Events still in flight from a previously joined board are dropped.
    pub async fn join(&mut self, board_id: BoardId) -> Result<()> {
        self.send(&ClientMessage::JoinBoard { board_id }).await?;
        loop {
            match self.next_message().await? {
                Some(ServerMessage::Joined { board_id: joined }) if joined == board_id => {
                    self.board_id = Some(board_id);
                    return Ok(());
                }
                Some(ServerMessage::Error { message }) => {
                    return Err(ClientError::Protocol(message).into());
                }
                Some(_) => continue,
                None => {
                    return Err(ClientError::Protocol(
                        "Connection closed before join was confirmed".to_string(),
                    )
                    .into());
                }
            }
        }
    }

    /// Stop receiving events for the joined board.
    pub async fn leave(&mut self) -> Result<()> {
        self.send(&ClientMessage::LeaveBoard).await?;
        self.board_id = None;
        Ok(())
    }

    /// The next event for the joined board. `None` once the server closes
    /// the connection.
    ///
    /// Fails with [`ClientError::Left`] when the server drops this user from
    /// the board's room (removed from the board, or the board was deleted);
    /// the stream is then joined to no board.
    pub async fn next_event(&mut self) -> Result<Option<BoardEvent>> {
        loop {
            match self.next_message().await? {
                Some(ServerMessage::Event { board_id, event }) => {
                    if Some(board_id) == self.board_id {
                        return Ok(Some(event));
                    }
                    debug!(%board_id, "dropping event for a board no longer joined");
                }
                Some(ServerMessage::Left { board_id, reason }) => {
                    if Some(board_id) == self.board_id {
                        self.board_id = None;
                        return Err(ClientError::Left { board_id, reason }.into());
                    }
                }
                Some(ServerMessage::Error { message }) => {
                    return Err(ClientError::Protocol(message).into());
                }
                Some(ServerMessage::Joined { .. }) => continue,
                None => return Ok(None),
            }
        }
    }

    /// The next frame from the server, whatever its kind.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>> {
        while let Some(frame) = self.socket.next().await {
            match frame.map_err(ClientError::from)? {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => warn!(error = %e, "failed to parse server message"),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.map_err(ClientError::from)?;
        Ok(())
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.socket
            .send(Message::text(text))
            .await
            .map_err(ClientError::from)?;
        Ok(())
    }
}

/// Rewrite an `http(s)://` base URL into the `/ws` endpoint URL.
fn socket_url(base_url: &str, user: UserId) -> std::result::Result<Url, ClientError> {
    let mut url = Url::parse(base_url)?.join("/ws")?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| ClientError::Protocol(format!("Cannot open a websocket to {base_url}")))?;
    url.query_pairs_mut()
        .append_pair(USER_QUERY_PARAM, &user.to_string());
    Ok(url)
}
