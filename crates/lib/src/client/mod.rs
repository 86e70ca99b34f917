//! Client side of the HTTP and websocket surface.
//!
//! [`HttpClient`] issues authoritative requests and implements
//! [`crate::coordinator::MoveApi`], so it can back a
//! [`crate::coordinator::MoveCoordinator`] directly. [`EventStream`] receives
//! the board events to feed into a [`crate::reconcile::Reconciler`].

mod errors;
mod http;
mod stream;

pub use errors::ClientError;
pub use http::HttpClient;
pub use stream::EventStream;
