// (c) 2026 The unirpc developers

#![allow(clippy::doc_markdown)]
//! `unirpc` drives the server side of a single unary remote procedure call:
//! receive one request message, hand it to application code, send back one response,
//! and report exactly one terminal status.
//!
//! ## Overview
//!
//! The interesting part is the [`UnarySession`](session::UnarySession) state machine.
//! It sits between three collaborators, each of which is a trait seam:
//!
//! * the transport, which implements [`CallHandler`](transport::CallHandler) for one call;
//! * the scheduler, which implements [`TaskSubmitter`](executor::TaskSubmitter);
//! * the message codec, which implements [`Message`](message::Message)
//!   (provided for every [`ProtocolMessage`](protocol::common::ProtocolMessage)).
//!
//! The application supplies a [`Provider`](session::Provider), usually a closure.
//!
//! ```text
//!  transport ──payload──▶ session ──submit──▶ worker task
//!                                              │ decode
//!                                              │ provider(request, context)
//!                                              │ encode + send_message
//!  transport ◀──────────── send_status ────────┘
//! ```
//!
//! Whatever happens (absent payload, malformed payload, application error, panic,
//! transport send failure) the transport sees exactly one `send_status` per call,
//! and never before the response message send has been issued.
//!
//! ## Reference collaborators
//!
//! * [`transport::memory`] is an in-process transport, handy for tests and demos.
//! * [`transport::stream`] carries a call over any async byte stream pair.
//! * [`executor::TokioSubmitter`] runs worker tasks on a tokio blocking pool.
//!
//! ## Configuration and logging
//!
//! See [`config`] for the tunable limits and how they are layered.
//! All diagnostics go through `tracing`; every call gets its own span carrying a
//! [`CallId`](session::CallId).
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub use config::Configuration;

pub mod error;
pub use error::{AppError, TransportError};

pub mod executor;
pub mod message;
pub mod protocol;
pub use protocol::{Metadata, Status, StatusCode};

pub mod session;
pub use session::{SessionContext, UnarySession};

pub mod transport;
pub mod util;
