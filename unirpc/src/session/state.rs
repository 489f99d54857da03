//! Session lifecycle states
// (c) 2026 The unirpc developers

/// Where a [`UnarySession`](super::UnarySession) is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum State {
    /// Constructed; nothing has happened on the call yet
    Created,
    /// The request has been asked for
    AwaitingRequest,
    /// The transport reported that no request is coming
    NoData,
    /// The request arrived and has been handed to a worker task
    Dispatched,
    /// The provider produced a response, which has been sent
    Succeeded,
    /// Decoding, the provider or encoding failed
    Failed,
    /// The terminal status has been handed to the transport
    StatusSent,
}

impl State {
    /// Whether the lifecycle permits moving from this state to `next`
    #[must_use]
    pub fn can_advance_to(self, next: State) -> bool {
        use State::{AwaitingRequest, Created, Dispatched, Failed, NoData, StatusSent, Succeeded};
        matches!(
            (self, next),
            (Created, AwaitingRequest)
                | (AwaitingRequest, NoData | Dispatched)
                | (Dispatched, Succeeded | Failed)
                | (NoData | Succeeded | Failed, StatusSent)
        )
    }

    /// Whether this is the final state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == State::StatusSent
    }
}
