//! Per-call identity and context
// (c) 2026 The unirpc developers

use uuid::Uuid;

use crate::Metadata;

/// Correlates every diagnostic about one call.
///
/// A fresh random (v4) UUID is generated for each session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(Uuid);

impl CallId {
    /// Generates a new random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.as_simple(), f)
    }
}

/// What a [`Provider`](super::Provider) can see of, and add to, its call
#[derive(Debug, Clone)]
pub struct SessionContext {
    call_id: CallId,
    request_metadata: Metadata,
    trailing_metadata: Metadata,
}

impl SessionContext {
    /// Constructor.
    ///
    /// Sessions create their own contexts; this is public so that providers can be
    /// exercised directly.
    #[must_use]
    pub fn new(request_metadata: Metadata) -> Self {
        Self::for_call(CallId::new(), request_metadata)
    }

    pub(crate) fn for_call(call_id: CallId, request_metadata: Metadata) -> Self {
        Self {
            call_id,
            request_metadata,
            trailing_metadata: Metadata::new(),
        }
    }

    /// The id of the call
    #[must_use]
    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Metadata the client sent with the call
    #[must_use]
    pub fn request_metadata(&self) -> &Metadata {
        &self.request_metadata
    }

    /// Adds an entry to the metadata sent along with the terminal status.
    ///
    /// This applies whatever the outcome of the call, so it can be used to
    /// annotate errors as well as successes.
    pub fn add_trailing_metadata<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) {
        self.trailing_metadata.add(key, value);
    }

    /// Trailing metadata added so far
    #[must_use]
    pub fn trailing_metadata(&self) -> &Metadata {
        &self.trailing_metadata
    }

    pub(crate) fn take_trailing_metadata(&mut self) -> Metadata {
        std::mem::take(&mut self.trailing_metadata)
    }
}
