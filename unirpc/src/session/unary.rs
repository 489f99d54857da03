//! The unary session itself
// (c) 2026 The unirpc developers

use std::{
    marker::PhantomData,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use bytes::Bytes;
use tracing::{Span, debug, error, error_span, trace, warn};

use super::{
    CallId, Provider, SessionContext, State,
    common::{panic_message, status_for_error},
};
use crate::{
    AppError, Configuration, Metadata, Status, StatusCode, TransportError,
    executor::TaskSubmitter, message::Message, transport::CallHandler,
};

/// Everything about a session except its provider.
///
/// This is split out so the provider can be moved into the worker task separately.
///
/// Dropping a `Core` that has been handed to the transport, but has not yet sent a status,
/// sends [`Status::abandoned`]. This happens if a transport drops the receive continuation,
/// or a submitter drops the worker task, without running it.
struct Core<C: CallHandler + ?Sized> {
    call: Arc<C>,
    context: SessionContext,
    initial_metadata: Metadata,
    max_request_size: u32,
    error_detail: bool,
    span: Span,
    state: State,
    /// Set once the transport has accepted the receive continuation
    accepted: Arc<AtomicBool>,
}

impl<C: CallHandler + ?Sized> Core<C> {
    fn advance(&mut self, next: State) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        trace!("{} -> {next}", self.state);
        self.state = next;
    }

    /// Receive continuation; runs on whatever thread the transport chooses
    fn on_payload<Req, Resp, P, S>(mut self, payload: Option<Bytes>, provider: P, submitter: &S)
    where
        Req: Message,
        Resp: Message,
        P: Provider<Req, Resp>,
        S: TaskSubmitter,
    {
        let span = self.span.clone();
        let _entered = span.enter();
        let Some(data) = payload else {
            debug!("no request data received");
            self.advance(State::NoData);
            self.finish(Status::no_request_data());
            return;
        };
        trace!("received request ({} bytes)", data.len());
        self.advance(State::Dispatched);
        submitter.submit(Box::new(move || self.process::<Req, Resp, P>(&data, provider)));
    }

    /// Worker task body
    fn process<Req, Resp, P>(mut self, data: &[u8], provider: P)
    where
        Req: Message,
        Resp: Message,
        P: Provider<Req, Resp>,
    {
        let span = self.span.clone();
        let _entered = span.enter();
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.compute::<Req, Resp, P>(data, provider)
        }))
        .unwrap_or_else(|payload| {
            let what = panic_message(&*payload);
            error!("panic while processing request: {what}");
            Err(AppError::msg(format!("panic while processing request: {what}")))
        });
        let status = match result {
            Ok(encoded) => {
                self.send_response(encoded);
                self.advance(State::Succeeded);
                Status::ok()
            }
            Err(e) => {
                self.advance(State::Failed);
                status_for_error(e, self.error_detail)
            }
        };
        self.finish(status);
    }

    /// Decode, invoke, encode. Nothing is sent here.
    fn compute<Req, Resp, P>(&mut self, data: &[u8], provider: P) -> Result<Bytes, AppError>
    where
        Req: Message,
        Resp: Message,
        P: Provider<Req, Resp>,
    {
        if !u32::try_from(data.len()).is_ok_and(|n| n <= self.max_request_size) {
            return Err(Status::new(
                StatusCode::ResourceExhausted,
                format!(
                    "request of {} bytes exceeds the limit of {}",
                    data.len(),
                    self.max_request_size
                ),
            )
            .into());
        }
        let request = Req::decode(data)?;
        let response = provider.handle(request, &mut self.context)?;
        response.encode()
    }

    /// Send failures are logged but otherwise ignored: they do not change the status.
    /// A transport that panics while sending is treated as having failed the send.
    fn send_response(&self, data: Bytes) {
        let len = data.len();
        let span = self.span.clone();
        let on_sent = Box::new(move |result: Option<TransportError>| {
            let _entered = span.enter();
            match result {
                None => trace!("sent response ({len} bytes)"),
                Some(e) => warn!("sending response: {e}"),
            }
        });
        match catch_unwind(AssertUnwindSafe(|| self.call.send_message(data, on_sent))) {
            Ok(Ok(())) => (),
            Ok(Err(e)) => warn!("sending response: {e}"),
            Err(payload) => error!("panic while sending response: {}", panic_message(&*payload)),
        }
    }

    fn finish(mut self, status: Status) {
        self.advance(State::StatusSent);
        self.send_status(status);
    }

    /// Hands the status, with any trailing metadata, to the transport
    fn send_status(&mut self, status: Status) {
        let status = status.with_trailing_metadata(self.context.take_trailing_metadata());
        debug!("finished with status {status}");
        if let Err(e) = self.call.send_status(status) {
            warn!("sending status: {e}");
        }
    }
}

impl<C: CallHandler + ?Sized> Drop for Core<C> {
    fn drop(&mut self) {
        let abandoned = match self.state {
            State::Created | State::StatusSent => false,
            State::AwaitingRequest => self.accepted.load(Ordering::Acquire),
            State::NoData | State::Dispatched | State::Succeeded | State::Failed => true,
        };
        if !abandoned {
            return;
        }
        let span = self.span.clone();
        let _entered = span.enter();
        warn!("call abandoned while {}", self.state);
        // Bypasses the transition table: abandonment can happen in any state
        self.state = State::StatusSent;
        self.send_status(Status::abandoned());
    }
}

/// The server side of one unary call.
///
/// Bind a call and a [`Provider`] with [`new`](Self::new), optionally adjust it with the
/// `with_` methods, then [`run`](Self::run) it. Running consumes the session; from then on
/// it is driven by the transport and the task submitter, and always ends by sending
/// exactly one status.
pub struct UnarySession<C: CallHandler + ?Sized, Req, Resp, P> {
    core: Core<C>,
    provider: P,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<C: CallHandler + ?Sized, Req, Resp, P> std::fmt::Debug for UnarySession<C, Req, Resp, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnarySession")
            .field("call_id", &self.core.context.call_id())
            .field("state", &self.core.state)
            .finish_non_exhaustive()
    }
}

impl<C, Req, Resp, P> UnarySession<C, Req, Resp, P>
where
    C: CallHandler + ?Sized,
    Req: Message,
    Resp: Message,
    P: Provider<Req, Resp>,
{
    /// Binds a call to a provider. Nothing happens on the call until [`run`](Self::run).
    ///
    /// Limits and error reporting follow [`Configuration::system_default`] unless
    /// [`with_config`](Self::with_config) says otherwise.
    #[must_use]
    pub fn new(call: Arc<C>, provider: P) -> Self {
        let call_id = CallId::new();
        let span = error_span!("UNARY", call = %call_id);
        let context = SessionContext::for_call(call_id, call.request_metadata());
        let defaults = Configuration::system_default();
        Self {
            core: Core {
                call,
                context,
                initial_metadata: Metadata::new(),
                max_request_size: defaults.max_request_size,
                error_detail: defaults.error_detail,
                span,
                state: State::Created,
                accepted: Arc::new(AtomicBool::new(false)),
            },
            provider,
            _types: PhantomData,
        }
    }

    /// Sets the initial metadata the server sends when it starts waiting for the request
    #[must_use]
    pub fn with_initial_metadata(mut self, metadata: Metadata) -> Self {
        self.core.initial_metadata = metadata;
        self
    }

    /// Applies the request size limit and error detail policy from a configuration
    #[must_use]
    pub fn with_config(mut self, config: &Configuration) -> Self {
        self.core.max_request_size = config.max_request_size;
        self.core.error_detail = config.error_detail;
        self
    }

    /// The id of this call, as it appears in diagnostics
    #[must_use]
    pub fn call_id(&self) -> CallId {
        self.core.context.call_id()
    }

    /// Where the session is in its lifecycle
    #[must_use]
    pub fn state(&self) -> State {
        self.core.state
    }

    /// Starts the session by asking the transport for the request.
    ///
    /// This returns as soon as the request has been asked for. The rest of the call happens
    /// when the transport delivers the request: processing is handed to `submitter`.
    ///
    /// # Errors
    /// If the transport refuses to receive (for example, the call is already closed),
    /// that error is returned and no status is sent.
    pub fn run<S: TaskSubmitter>(self, submitter: S) -> Result<(), TransportError> {
        let Self {
            mut core, provider, ..
        } = self;
        let span = core.span.clone();
        let _entered = span.enter();
        core.advance(State::AwaitingRequest);
        let call = Arc::clone(&core.call);
        let accepted = Arc::clone(&core.accepted);
        let initial_metadata = std::mem::take(&mut core.initial_metadata);
        let result = call.receive_message(
            initial_metadata,
            Box::new(move |payload: Option<Bytes>| {
                core.on_payload::<Req, Resp, P, S>(payload, provider, &submitter);
            }),
        );
        match &result {
            Ok(()) => accepted.store(true, Ordering::Release),
            Err(e) => warn!("could not receive request: {e}"),
        }
        result
    }
}
