// (c) 2026 The unirpc developers

//! # 📖 The unary session
//!
//! A [`UnarySession`] owns the server side of one unary call from the moment the
//! request is awaited until the terminal status is handed to the transport.
//!
//! ```text
//! Created ──▶ AwaitingRequest ──▶ Dispatched ──▶ Succeeded ──┐
//!                    │                  └──────▶ Failed ─────┤
//!                    └────────▶ NoData ──────────────────────┴──▶ StatusSent
//! ```
//!
//! Each step consumes the session, so it is not possible to send a second status:
//! the code that would do so no longer has anything to send it with.
//!
//! Application code is a [`Provider`], normally a closure:
//!
//! ```
//! use unirpc::{
//!     AppError, Metadata, SessionContext, StatusCode, UnarySession,
//!     executor::InlineSubmitter,
//!     transport::memory::MemoryCall,
//! };
//!
//! // Any ProtocolMessage can be a request or a response
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Name(String);
//! impl unirpc::protocol::common::ProtocolMessage for Name {}
//!
//! let (call, peer) = MemoryCall::new(Metadata::new());
//! let session = UnarySession::new(call, |req: Name, ctx: &mut SessionContext| {
//!     ctx.add_trailing_metadata("served-by", "doctest");
//!     Ok::<_, AppError>(Name(format!("hi {}", req.0)))
//! });
//! session.run(InlineSubmitter).unwrap();
//! peer.send_request(vec![2, b'b', b'o']);
//!
//! let transcript = peer.transcript();
//! assert!(transcript.is_well_formed());
//! assert_eq!(transcript.status().unwrap().code(), StatusCode::Ok);
//! ```

mod common;
mod context;
mod provider;
mod state;
mod unary;

pub use context::{CallId, SessionContext};
pub use provider::Provider;
pub use state::State;
pub use unary::UnarySession;
