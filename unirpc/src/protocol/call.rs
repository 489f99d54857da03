// (c) 2026 The unirpc developers

//! Frames exchanged by the [stream transport](crate::transport::stream)
//!
//! These are BARE unions; see the [module documentation](super) for the sequence.
use super::{Metadata, StatusV1, common::ProtocolMessage};
use serde::{Deserialize, Serialize};

/// Largest frame we accept in either direction. Individual request size limits are
/// enforced later, by the session (see [`Configuration`](crate::Configuration)).
const FRAME_LIMIT: u32 = 16 * 1_048_576;

/// A frame sent from client to server
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, strum_macros::Display)]
pub enum ClientFrame {
    /// Request metadata. Must be the first frame on the stream.
    Metadata(Metadata),
    /// The request payload
    Message(Vec<u8>),
    /// The client will not send a request
    HalfClose,
}
impl ProtocolMessage for ClientFrame {
    const WIRE_ENCODING_LIMIT: u32 = FRAME_LIMIT;
}

/// A frame sent from server to client
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, strum_macros::Display)]
pub enum ServerFrame {
    /// Server initial metadata, sent when the server starts to wait for the request
    InitialMetadata(Metadata),
    /// The response payload
    Message(Vec<u8>),
    /// Terminal status; nothing follows
    Status(StatusV1),
}
impl ProtocolMessage for ServerFrame {
    const WIRE_ENCODING_LIMIT: u32 = FRAME_LIMIT;
}
