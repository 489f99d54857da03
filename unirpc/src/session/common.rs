//! Mapping failures to statuses
// (c) 2026 The unirpc developers

use tracing::{debug, warn};

use crate::{AppError, Status};

/// Works out the terminal status for a failed call.
///
/// A pre-built status is used verbatim. Anything else is an `internal` status; whether
/// it describes the error to the client depends on `error_detail`.
pub(super) fn status_for_error(err: AppError, error_detail: bool) -> Status {
    match err {
        AppError::Status(st) => {
            debug!("provider raised status {st}");
            *st
        }
        AppError::Generic(e) => {
            warn!("error processing request: {e:#}");
            if error_detail {
                Status::internal(format!("{e:#}"))
            } else {
                Status::processing_error()
            }
        }
    }
}

/// Describes a caught panic payload
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
