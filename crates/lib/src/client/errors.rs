//! Error types for talking to a boardsync server.

use thiserror::Error;

use crate::model::BoardId;

/// Errors raised by [`super::HttpClient`] and [`super::EventStream`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server sent something this client does not understand, or
    /// refused a websocket request.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server stopped forwarding the joined board's events.
    #[error("Left board {board_id}: {reason}")]
    Left { board_id: BoardId, reason: String },
}

impl ClientError {
    /// The HTTP status the server answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(Box::new(err))
    }
}

impl From<ClientError> for crate::Error {
    fn from(err: ClientError) -> Self {
        crate::Error::Client(err)
    }
}
