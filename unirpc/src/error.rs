//! Error types
// (c) 2026 The unirpc developers

use crate::protocol::Status;

/// The ways in which application code (or the message codec) can fail a call.
///
/// This is what a [`Provider`](crate::session::Provider) returns on failure.
/// The session turns it into the terminal [`Status`]:
///
/// * [`AppError::Status`] is sent verbatim. Use this to choose a precise code
///   (e.g. [`StatusCode::NotFound`](crate::StatusCode::NotFound)).
/// * [`AppError::Generic`] becomes an `internal` status whose message describes the error.
///
/// Both `Status` and `anyhow::Error` convert into `AppError`, so `?` works on either.
/// An `anyhow::Error` that wraps a `Status` is unwrapped into `AppError::Status`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A pre-built status, to be forwarded as-is
    #[error(transparent)]
    Status(Box<Status>),
    /// Any other failure
    #[error(transparent)]
    Generic(anyhow::Error),
}

impl AppError {
    /// Convenience constructor for a generic error from a message
    #[must_use]
    pub fn msg<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::Generic(anyhow::Error::msg(message))
    }

    /// Convenience constructor for a generic error from any standard error type.
    ///
    /// (There is no blanket `From` for these, as it would collide with `From<Status>`.)
    #[must_use]
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::from(anyhow::Error::new(error))
    }
}

impl From<Status> for AppError {
    fn from(value: Status) -> Self {
        Self::Status(Box::new(value))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        match value.downcast::<Status>() {
            Ok(status) => Self::from(status),
            Err(e) => Self::Generic(e),
        }
    }
}

/// Errors reported by a [`CallHandler`](crate::transport::CallHandler)
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The call has finished, or the peer has gone away
    #[error("call is closed")]
    Closed,
    /// The peer cancelled the call
    #[error("call was cancelled")]
    Cancelled,
    /// A request message has already been requested on this call
    #[error("receive already requested on this call")]
    AlreadyReceived,
    /// The peer broke the protocol
    #[error("protocol error: {0}")]
    Protocol(Box<str>),
    /// Lower-level I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

static_assertions::assert_impl_all!(AppError: Send, Sync);
static_assertions::assert_impl_all!(TransportError: Send, Sync);
