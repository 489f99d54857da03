// (c) 2026 The unirpc developers

//! The transport-facing side of a call
//!
//! A transport exposes each call to the session through a [`CallHandler`].
//! Two implementations are provided:
//!
//! * [`memory::MemoryCall`] keeps everything in-process. It is mostly useful for testing
//!   and for driving the session from code that already has the request in hand.
//! * [`stream::StreamCall`] speaks the [stream protocol](crate::protocol) over any async byte stream pair.
use bytes::Bytes;

use crate::{Metadata, Status, TransportError};

pub mod memory;
pub mod stream;

/// Continuation for [`CallHandler::receive_message`].
/// `None` means that no request payload arrived (which is not the same as an empty payload).
pub type ReceiveCallback = Box<dyn FnOnce(Option<Bytes>) + Send + 'static>;

/// Completion for [`CallHandler::send_message`]. `None` means success.
pub type SendCallback = Box<dyn FnOnce(Option<TransportError>) + Send + 'static>;

/// Receive and send primitives for a single call.
///
/// A call handler is shared between the transport and the session (usually via `Arc`),
/// so all operations take `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait CallHandler: Send + Sync + 'static {
    /// Metadata the client sent when opening the call
    fn request_metadata(&self) -> Metadata;

    /// Sends the server's initial metadata, then asynchronously waits for the request payload.
    ///
    /// `on_received` is invoked exactly once if and only if this returns `Ok`.
    /// Transport failures while waiting are delivered as `None`.
    fn receive_message(
        &self,
        initial_metadata: Metadata,
        on_received: ReceiveCallback,
    ) -> Result<(), TransportError>;

    /// Asynchronously sends a response payload.
    ///
    /// `on_sent` is invoked exactly once if and only if this returns `Ok`.
    fn send_message(&self, data: Bytes, on_sent: SendCallback) -> Result<(), TransportError>;

    /// Sends the terminal status. The call is finished after this, whether or not it succeeds.
    fn send_status(&self, status: Status) -> Result<(), TransportError>;
}

/// Everything a client saw of a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// The server's initial metadata
    pub initial_metadata: Metadata,
    /// The response payload, if one was sent
    pub message: Option<Bytes>,
    /// The terminal status
    pub status: Status,
}
