//! Control transport abstraction.
//!
//! Concrete implementations:
//! - Unix stream socket ([`crate::adapters::unix_socket`])
//! - in-memory scripted transport (integration tests)
//!
//! The control loop is generic over `ControlTransport`, so it never sees
//! sockets, connection slots or partial lines.

use super::codec::Line;
use super::response::Response;

/// Opaque per-connection handle, stable for the life of the connection.
pub type ClientId = usize;

/// A multi-client, line-oriented command channel.
pub trait ControlTransport {
    /// One non-blocking pass over all endpoints.
    ///
    /// Accepts at most one pending connection, drains the bytes already
    /// available on every connection, and calls `handler` once per complete
    /// line in arrival order.  The returned [`Response`] is queued to the
    /// same client.  Must not block.
    fn poll<F>(&mut self, handler: F)
    where
        F: FnMut(ClientId, Line<'_>) -> Response;

    /// Number of open connections.
    fn connected(&self) -> usize;

    /// Close every connection and the listening endpoint.
    fn close_all(&mut self);
}

/// A transport with no clients.  Runs the loop headless.
#[derive(Debug, Default)]
pub struct NullTransport;

impl ControlTransport for NullTransport {
    fn poll<F>(&mut self, _handler: F)
    where
        F: FnMut(ClientId, Line<'_>) -> Response,
    {
    }

    fn connected(&self) -> usize {
        0
    }

    fn close_all(&mut self) {}
}
