// (c) 2026 The unirpc developers

//! In-process transport
//!
//! [`MemoryCall`] is the server side of a call; [`MemoryPeer`] plays the client.
//! The peer decides when (and whether) the request arrives, and can inspect a
//! [`Transcript`] of everything the server did to the call.
//!
//! Faults can be injected to exercise the session's failure handling; see [`Faults`].
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;
use tracing::{trace, warn};

use super::{CallHandler, CallOutcome, ReceiveCallback, SendCallback};
use crate::{Metadata, Status, TransportError};

/// How a send should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFault {
    /// The send call itself returns an error
    Immediate,
    /// The send call succeeds, but its completion reports an error
    Completion,
}

/// Faults to inject into a [`MemoryCall`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Faults {
    /// The call is already closed: attempts to receive fail
    pub closed: bool,
    /// Message sends fail
    pub message_send: Option<SendFault>,
    /// Status sends fail
    pub status_send: bool,
}

/// Something the server did to a [`MemoryCall`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// Initial metadata was sent (when the server asked for the request)
    InitialMetadata(Metadata),
    /// A response message was sent
    Message(Bytes),
    /// A response message send was attempted, but failed
    MessageFailed(Bytes),
    /// A status was sent
    Status(Status),
    /// A status send was attempted, but failed
    StatusFailed(Status),
}

/// The sequence of [`CallEvent`]s on a call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    /// Events in the order they happened
    pub events: Vec<CallEvent>,
}

impl Transcript {
    /// Number of message sends attempted, successful or not
    #[must_use]
    pub fn message_attempts(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CallEvent::Message(_) | CallEvent::MessageFailed(_)))
            .count()
    }

    /// Successfully sent messages
    #[must_use]
    pub fn messages(&self) -> Vec<&Bytes> {
        self.events
            .iter()
            .filter_map(|e| match e {
                CallEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Every status send attempted, successful or not
    #[must_use]
    pub fn status_attempts(&self) -> Vec<&Status> {
        self.events
            .iter()
            .filter_map(|e| match e {
                CallEvent::Status(s) | CallEvent::StatusFailed(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// The status, if exactly one status send was attempted
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        match self.status_attempts().as_slice() {
            [st] => Some(st),
            _ => None,
        }
    }

    /// Checks the unary call discipline: at most one message attempt,
    /// exactly one status attempt, and the status attempt comes last.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.message_attempts() <= 1
            && self.status_attempts().len() == 1
            && matches!(
                self.events.last(),
                Some(CallEvent::Status(_) | CallEvent::StatusFailed(_))
            )
    }

    /// What a client would have seen, if the status made it out
    #[must_use]
    pub fn outcome(&self) -> Option<CallOutcome> {
        let mut outcome = CallOutcome {
            initial_metadata: Metadata::new(),
            message: None,
            status: Status::ok(),
        };
        let mut finished = false;
        for event in &self.events {
            match event {
                CallEvent::InitialMetadata(md) => outcome.initial_metadata = md.clone(),
                CallEvent::Message(m) => outcome.message = Some(m.clone()),
                CallEvent::Status(st) => {
                    outcome.status = st.clone();
                    finished = true;
                }
                CallEvent::MessageFailed(_) | CallEvent::StatusFailed(_) => (),
            }
        }
        finished.then_some(outcome)
    }
}

/// Progress of the single request from the peer
#[derive(Default)]
enum Request {
    #[default]
    Awaited,
    /// Delivered by the peer before the server asked for it
    Held(Option<Bytes>),
    HandedOver,
}

#[derive(Default)]
struct State {
    on_received: Option<ReceiveCallback>,
    request: Request,
    receive_requested: bool,
    events: Vec<CallEvent>,
}

impl State {
    fn finished(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, CallEvent::Status(_) | CallEvent::StatusFailed(_)))
    }
}

/// The server side of an in-process call
pub struct MemoryCall {
    request_metadata: Metadata,
    faults: Faults,
    state: Mutex<State>,
    done: Notify,
}

impl std::fmt::Debug for MemoryCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCall")
            .field("request_metadata", &self.request_metadata)
            .field("faults", &self.faults)
            .field("events", &self.lock().events)
            .finish_non_exhaustive()
    }
}

impl MemoryCall {
    /// Creates a call, returning the server side and the client side
    #[must_use]
    pub fn new(request_metadata: Metadata) -> (Arc<Self>, MemoryPeer) {
        Self::with_faults(request_metadata, Faults::default())
    }

    /// Creates a call which will misbehave as directed
    #[must_use]
    pub fn with_faults(request_metadata: Metadata, faults: Faults) -> (Arc<Self>, MemoryPeer) {
        let call = Arc::new(Self {
            request_metadata,
            faults,
            state: Mutex::new(State::default()),
            done: Notify::new(),
        });
        let peer = MemoryPeer {
            call: Arc::clone(&call),
        };
        (call, peer)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Callbacks never run under the lock, so poisoning can only come from a panic in here.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, payload: Option<Bytes>) {
        let callback = {
            let mut state = self.lock();
            if !matches!(state.request, Request::Awaited) {
                warn!("request already delivered; ignoring");
                return;
            }
            if let Some(cb) = state.on_received.take() {
                state.request = Request::HandedOver;
                cb
            } else {
                state.request = Request::Held(payload);
                return;
            }
        };
        trace!("delivering request");
        callback(payload);
    }
}

impl CallHandler for MemoryCall {
    fn request_metadata(&self) -> Metadata {
        self.request_metadata.clone()
    }

    fn receive_message(
        &self,
        initial_metadata: Metadata,
        on_received: ReceiveCallback,
    ) -> Result<(), TransportError> {
        if self.faults.closed {
            return Err(TransportError::Closed);
        }
        let pending = {
            let mut state = self.lock();
            if state.receive_requested {
                return Err(TransportError::AlreadyReceived);
            }
            state.receive_requested = true;
            state
                .events
                .push(CallEvent::InitialMetadata(initial_metadata));
            match std::mem::replace(&mut state.request, Request::HandedOver) {
                Request::Held(pending) => pending,
                other => {
                    state.request = other;
                    state.on_received = Some(on_received);
                    return Ok(());
                }
            }
        };
        on_received(pending);
        Ok(())
    }

    fn send_message(&self, data: Bytes, on_sent: SendCallback) -> Result<(), TransportError> {
        {
            let mut state = self.lock();
            if state.finished() {
                return Err(TransportError::Closed);
            }
            match self.faults.message_send {
                None => state.events.push(CallEvent::Message(data)),
                Some(SendFault::Immediate) => {
                    state.events.push(CallEvent::MessageFailed(data));
                    return Err(TransportError::Closed);
                }
                Some(SendFault::Completion) => state.events.push(CallEvent::MessageFailed(data)),
            }
        }
        let result = match self.faults.message_send {
            Some(SendFault::Completion) => Some(TransportError::Cancelled),
            _ => None,
        };
        on_sent(result);
        Ok(())
    }

    fn send_status(&self, status: Status) -> Result<(), TransportError> {
        let result = {
            let mut state = self.lock();
            if state.finished() || self.faults.status_send {
                state.events.push(CallEvent::StatusFailed(status));
                Err(TransportError::Closed)
            } else {
                state.events.push(CallEvent::Status(status));
                Ok(())
            }
        };
        self.done.notify_one();
        result
    }
}

/// The client side of an in-process call
#[derive(Debug)]
pub struct MemoryPeer {
    call: Arc<MemoryCall>,
}

impl MemoryPeer {
    /// Delivers the request payload to the server.
    /// Only the first delivery (of a payload, or of its absence) counts.
    pub fn send_request<B: Into<Bytes>>(&self, payload: B) {
        self.call.deliver(Some(payload.into()));
    }

    /// Tells the server no request payload is coming
    pub fn half_close(&self) {
        self.call.deliver(None);
    }

    /// A snapshot of what has happened so far
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        Transcript {
            events: self.call.lock().events.clone(),
        }
    }

    /// Waits for a status send to be attempted, then returns the transcript
    pub async fn finished(&self) -> Transcript {
        self.call.done.notified().await;
        self.transcript()
    }
}
