//! Terminal call status
// (c) 2026 The unirpc developers

use super::{Metadata, common::ProtocolMessage};

use serde::{Deserialize, Serialize};
use serde_bare::Uint;
use std::fmt::Display;

/// Machine-readable codes describing the outcome of a call.
///
/// The numeric values match the widely used gRPC status code set; on the wire a code is
/// carried as a plain [`Uint`] (see [`StatusV1`]) so that values we don't know about can
/// still be passed around.
#[derive(
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::FromRepr,
    strum_macros::VariantNames,
)]
#[strum(serialize_all = "snake_case")]
#[allow(missing_docs)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl From<StatusCode> for Uint {
    fn from(value: StatusCode) -> Self {
        Self(value as u64)
    }
}

impl TryFrom<Uint> for StatusCode {
    type Error = anyhow::Error;

    fn try_from(value: Uint) -> Result<Self, Self::Error> {
        usize::try_from(value.0)
            .ok()
            .and_then(StatusCode::from_repr)
            .ok_or_else(|| anyhow::anyhow!("unknown status code {}", value.0))
    }
}

impl StatusCode {
    /// String conversion function for a Uint that holds a status code
    #[must_use]
    pub fn to_string(value: Uint) -> String {
        StatusCode::try_from(value).map_or_else(
            |_| format!("Unknown status code {}", value.0),
            |st| st.to_string(),
        )
    }
}

/// The terminal outcome of a call: a code, an optional human-readable message and
/// any trailing metadata.
///
/// A `Status` is also an error type, so application code can fail with one
/// to choose a precise code (see [`AppError`](crate::AppError)).
#[derive(PartialEq, Eq, Debug, Clone, thiserror::Error)]
pub struct Status {
    code: StatusCode,
    message: Option<String>,
    trailing_metadata: Metadata,
}

impl Status {
    /// Standard message sent with [`Status::ok`]
    pub const OK_MESSAGE: &'static str = "OK";
    /// Standard message sent with [`Status::no_request_data`]
    pub const NO_REQUEST_DATA_MESSAGE: &'static str = "no request data received";
    /// Standard message sent with [`Status::processing_error`]
    pub const PROCESSING_ERROR_MESSAGE: &'static str = "unknown error processing request";
    /// Standard message sent with [`Status::abandoned`]
    pub const ABANDONED_MESSAGE: &'static str = "call abandoned before completion";

    /// Constructor
    #[must_use]
    pub fn new<S: Into<String>>(code: StatusCode, message: S) -> Self {
        Self {
            code,
            message: Some(message.into()),
            trailing_metadata: Metadata::new(),
        }
    }

    /// Constructor for a status with no message
    #[must_use]
    pub fn from_code(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
            trailing_metadata: Metadata::new(),
        }
    }

    /// The call succeeded
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok, Self::OK_MESSAGE)
    }

    /// The client opened the call but never sent a request message
    #[must_use]
    pub fn no_request_data() -> Self {
        Self::new(StatusCode::Internal, Self::NO_REQUEST_DATA_MESSAGE)
    }

    /// The call was dropped by its transport or task submitter before it could finish
    #[must_use]
    pub fn abandoned() -> Self {
        Self::new(StatusCode::Unavailable, Self::ABANDONED_MESSAGE)
    }

    /// Something went wrong, and we're not saying what
    #[must_use]
    pub fn processing_error() -> Self {
        Self::new(StatusCode::Internal, Self::PROCESSING_ERROR_MESSAGE)
    }

    /// Something went wrong; the detail is included in the message
    #[must_use]
    pub fn internal<D: Display>(detail: D) -> Self {
        Self::new(StatusCode::Internal, format!("server error: {detail}"))
    }

    /// Builder-style setter for trailing metadata.
    /// Any metadata already present is kept.
    #[must_use]
    pub fn with_trailing_metadata(mut self, metadata: Metadata) -> Self {
        self.trailing_metadata.append(metadata);
        self
    }

    /// Accessor
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Accessor
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Accessor
    #[must_use]
    pub fn trailing_metadata(&self) -> &Metadata {
        &self.trailing_metadata
    }

    /// Convenience check for [`StatusCode::Ok`]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} with message {msg}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Version 1 of the on-wire representation of a [`Status`]
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, derive_more::Constructor)]
pub struct StatusV1 {
    /// A [`StatusCode`], though it may be outside of the set of values we know
    pub code: Uint,
    /// A human-readable message giving more information, if any is pertinent
    pub message: Option<String>,
    /// Trailing metadata
    pub trailing_metadata: Metadata,
}
impl ProtocolMessage for StatusV1 {
    const WIRE_ENCODING_LIMIT: u32 = 65_536;
}

impl Display for StatusV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = StatusCode::to_string(self.code);
        match &self.message {
            Some(msg) => write!(f, "{str} with message {msg}"),
            None => write!(f, "{str}"),
        }
    }
}

impl From<Status> for StatusV1 {
    fn from(value: Status) -> Self {
        Self {
            code: value.code.into(),
            message: value.message,
            trailing_metadata: value.trailing_metadata,
        }
    }
}

/// Unrecognised codes are mapped to [`StatusCode::Unknown`], with the original value
/// noted in the message.
impl From<StatusV1> for Status {
    fn from(value: StatusV1) -> Self {
        let (code, message) = if let Ok(code) = StatusCode::try_from(value.code) {
            (code, value.message)
        } else {
            let prefix = StatusCode::to_string(value.code);
            let message = match value.message {
                Some(m) => format!("{prefix}: {m}"),
                None => prefix,
            };
            (StatusCode::Unknown, Some(message))
        };
        Self {
            code,
            message,
            trailing_metadata: value.trailing_metadata,
        }
    }
}

impl PartialEq<Uint> for StatusCode {
    fn eq(&self, other: &Uint) -> bool {
        *self as u64 == other.0
    }
}

impl PartialEq<StatusCode> for Uint {
    fn eq(&self, other: &StatusCode) -> bool {
        self.0 == *other as u64
    }
}

static_assertions::assert_impl_all!(Status: Send, Sync, std::error::Error);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::{Status, StatusCode, StatusV1};
    use crate::protocol::{Metadata, common::ProtocolMessage};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use serde_bare::Uint;
    use std::str::FromStr;

    #[test]
    fn display() {
        let st = Status::new(StatusCode::NotFound, "missing");
        assert_eq!(st.to_string(), "not_found with message missing");
        assert_eq!(Status::from_code(StatusCode::Ok).to_string(), "ok");
    }

    #[test]
    fn well_known_statuses() {
        assert!(Status::ok().is_ok());
        assert_eq!(Status::ok().message(), Some("OK"));
        let st = Status::no_request_data();
        assert_eq!(st.code(), StatusCode::Internal);
        assert_eq!(st.message(), Some(Status::NO_REQUEST_DATA_MESSAGE));
        assert_ne!(st, Status::processing_error());
        assert_eq!(Status::abandoned().code(), StatusCode::Unavailable);
        assert_eq!(
            Status::internal("kaboom").message(),
            Some("server error: kaboom")
        );
    }

    #[test]
    fn code_from_str() {
        assert_eq!(
            StatusCode::from_str("invalid_argument").unwrap(),
            StatusCode::InvalidArgument
        );
        let _ = StatusCode::from_str("no_such_code").unwrap_err();
    }

    #[test]
    fn wire_marshalling_status_v1() {
        let st = Status::new(StatusCode::NotFound, "hi");
        let wire = StatusV1::from(st).to_vec().unwrap();
        // code 5; Some; string "hi"; no metadata
        let expected = b"\x05\x01\x02hi\x00".to_vec();
        assert_eq!(wire, expected);
    }

    #[test]
    fn wire_conversion_preserves_everything() {
        let st = Status::new(StatusCode::PermissionDenied, "go away")
            .with_trailing_metadata(Metadata::new().with("retry-after", "never"));
        let wire = StatusV1::from(st.clone());
        let decoded = StatusV1::from_slice(&wire.to_vec().unwrap()).unwrap();
        assert_eq!(Status::from(decoded), st);
    }

    #[test]
    fn unknown_code_doesnt_crash() {
        // hand-created: an outrageously large status code (2,097,151)
        let wire = &[255u8, 255, 127, 0, 0];
        let deser = StatusV1::from_slice(wire).unwrap();
        assert_contains!(deser.to_string(), "Unknown status code 2097151");
        let st = Status::from(deser);
        assert_eq!(st.code(), StatusCode::Unknown);
        assert_contains!(st.message().unwrap(), "2097151");
    }

    #[test]
    fn code_equality() {
        let st = StatusCode::ResourceExhausted;
        let u = Uint::from(st);
        assert_eq!(u, Uint(8));
        assert_eq!(st, u);
        assert_eq!(u, st);
    }

    #[test]
    fn trailing_metadata_accumulates() {
        let st = Status::ok()
            .with_trailing_metadata(Metadata::new().with("a", "1"))
            .with_trailing_metadata(Metadata::new().with("b", "2"));
        assert_eq!(st.trailing_metadata().len(), 2);
    }
}
