//! Application code
// (c) 2026 The unirpc developers

use super::SessionContext;
use crate::AppError;

/// The application logic for a unary method: turns one request into one response.
///
/// This is implemented for every suitable closure (or function), so it is rarely
/// necessary to implement it by hand.
///
/// A provider runs on a worker task, exactly once, and must not send anything on the
/// call itself. Its outcome is reported by the session:
/// * `Ok(response)` is sent, followed by an `ok` status;
/// * `Err(AppError::Status(..))` is sent as the status, verbatim;
/// * any other error becomes an `internal` status.
///
/// A provider that panics is treated as having returned a generic error.
pub trait Provider<Req, Resp>: Send + 'static {
    /// Handles one request
    fn handle(self, request: Req, context: &mut SessionContext) -> Result<Resp, AppError>;
}

impl<Req, Resp, F> Provider<Req, Resp> for F
where
    F: FnOnce(Req, &mut SessionContext) -> Result<Resp, AppError> + Send + 'static,
{
    fn handle(self, request: Req, context: &mut SessionContext) -> Result<Resp, AppError> {
        self(request, context)
    }
}
