// (c) 2026 The unirpc developers

//! # 📖 Wire-level types
//!
//! The session core itself is agnostic about the wire. This module holds the
//! vocabulary it shares with transports:
//!
//! * [`Status`] and [`StatusCode`], the terminal outcome of a call;
//! * [`Metadata`], key/value pairs exchanged before and after the message;
//! * [`common::ProtocolMessage`], [BARE] encoding and length-prefixed framing for anything serde can handle;
//! * [`call`], the frames used by the [stream transport](crate::transport::stream).
//!
//! ## Stream protocol
//!
//! One call occupies one bidirectional byte stream.
//!
//! * Client ➡️ Server: [`ClientFrame::Metadata`](call::ClientFrame::Metadata), always first
//! * Client ➡️ Server: [`ClientFrame::Message`](call::ClientFrame::Message) carrying the request payload,
//!   _or_ [`ClientFrame::HalfClose`](call::ClientFrame::HalfClose) if the client has nothing to send
//! * Server ➡️ Client: [`ServerFrame::InitialMetadata`](call::ServerFrame::InitialMetadata)
//! * Server ➡️ Client: at most one [`ServerFrame::Message`](call::ServerFrame::Message)
//! * Server ➡️ Client: exactly one [`ServerFrame::Status`](call::ServerFrame::Status), after which the server closes its half
//!
//! Every frame is preceded by a [`MessageHeader`](common::MessageHeader).
//!
//! [BARE]: https://www.ietf.org/archive/id/draft-devault-bare-11.html

pub mod call;
pub mod common;

mod metadata;
pub use metadata::Metadata;

mod status;
pub use status::{Status, StatusCode, StatusV1};

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod test_helpers;
