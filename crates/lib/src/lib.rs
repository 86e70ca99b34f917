//!
//! boardsync: ordered board collections that stay consistent across
//! concurrently connected clients.
//!
//! ## Core Concepts
//!
//! * **Positions (`position`)**: opaque `f64` sort keys. New values are derived
//!   from the neighbours at the target slot so that a move only rewrites the
//!   moved row. When a gap is exhausted a whole list is renumbered in one pass.
//! * **Views (`view::BoardView`)**: the client's copy of one board. Every
//!   mutation keeps lists and tasks sorted by position and is idempotent by id.
//! * **Move coordination (`coordinator::MoveCoordinator`)**: turns a drag
//!   gesture into an optimistic local move plus an authoritative request, and
//!   rolls the task back when the request is rejected.
//! * **Reconciliation (`reconcile::Reconciler`)**: merges events from other
//!   clients (and echoes of our own) into a view.
//! * **Hub (`hub::BoardHub`)**: per-board broadcast rooms on the server.
//! * **Service (`service::BoardService`)**: the authoritative write path,
//!   serialized per list, backed by `storage::Storage`.
//! * **API (`api`) and client (`client`)**: the axum HTTP/websocket surface and
//!   its reqwest/tungstenite counterpart.

pub mod api;
pub mod client;
pub mod clock;
pub mod constants;
pub mod coordinator;
pub mod hub;
pub mod model;
pub mod position;
pub mod protocol;
pub mod reconcile;
pub mod service;
pub mod storage;
pub mod view;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use service::BoardService;
pub use view::BoardView;

/// Result type used throughout the boardsync library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the boardsync library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Payload failed boundary validation
    #[error(transparent)]
    Model(model::ModelError),

    /// Structured errors from the client-side view
    #[error(transparent)]
    View(view::ViewError),

    /// Structured errors from the authoritative service
    #[error(transparent)]
    Service(service::ServiceError),

    /// Structured errors from the HTTP/websocket client
    #[error(transparent)]
    Client(client::ClientError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Model(_) => "model",
            Error::View(_) => "view",
            Error::Service(_) => "service",
            Error::Client(_) => "client",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::View(view_err) => view_err.is_not_found(),
            Error::Service(service_err) => service_err.is_not_found(),
            Error::Client(client_err) => client_err.status() == Some(404),
            _ => false,
        }
    }

    /// Check if this error indicates the acting user lacks access.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Service(service_err) => service_err.is_permission_denied(),
            Error::Client(client_err) => client_err.status() == Some(403),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Service(service_err) => service_err.is_conflict(),
            Error::Client(client_err) => client_err.status() == Some(409),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    ///
    /// Validation errors are raised before any mutation happens.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Model(_) => true,
            Error::Serialize(_) => true,
            Error::Service(service_err) => service_err.is_validation_error(),
            Error::Client(client_err) => client_err.status() == Some(400),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this error came from talking to a remote server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Client(_))
    }
}
