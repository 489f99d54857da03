//! A demonstration service: say hello
// (c) 2026 The unirpc developers

use serde::{Deserialize, Serialize};
use unirpc::{
    AppError, SessionContext, Status, StatusCode, protocol::common::ProtocolMessage,
    session::Provider,
};

/// Who to greet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HelloRequest {
    /// Must not be empty
    pub name: String,
}
impl ProtocolMessage for HelloRequest {
    const WIRE_ENCODING_LIMIT: u32 = 4096;
}

/// The greeting
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HelloReply {
    /// The greeting
    pub greeting: String,
}
impl ProtocolMessage for HelloReply {}

/// Trailing metadata key carrying the greeter's version
pub const VERSION_KEY: &str = "greeter-version";

/// The greeter, which can be told to misbehave
#[derive(Debug, Clone, Default)]
pub struct Greeter {
    /// If set, every call fails with this status
    pub fail: Option<Status>,
}

impl Greeter {
    /// Handles one request
    pub fn greet(
        self,
        request: HelloRequest,
        ctx: &mut SessionContext,
    ) -> Result<HelloReply, AppError> {
        ctx.add_trailing_metadata(VERSION_KEY, env!("CARGO_PKG_VERSION"));
        if let Some(st) = self.fail {
            return Err(st.into());
        }
        let HelloRequest { name } = request;
        if name.is_empty() {
            return Err(Status::new(StatusCode::InvalidArgument, "name must not be empty").into());
        }
        tracing::debug!(call = %ctx.call_id(), "greeting {name}");
        Ok(HelloReply {
            greeting: format!("hi {name}"),
        })
    }

    /// Wraps this greeter as a session provider
    #[must_use]
    pub fn provider(self) -> impl Provider<HelloRequest, HelloReply> {
        move |request: HelloRequest, ctx: &mut SessionContext| self.greet(request, ctx)
    }
}
