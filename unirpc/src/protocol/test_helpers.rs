//! In-memory stream pairs for exercising the wire protocol
// (c) 2026 The unirpc developers

use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};

/// The streams one party holds: (sending half, receiving half)
pub(crate) type TestStreamPair = (WriteHalf<DuplexStream>, ReadHalf<DuplexStream>);

/// Connects two parties, returning (client end, server end).
/// Whatever one end sends, the other end receives.
pub(crate) fn new_test_plumbing() -> (TestStreamPair, TestStreamPair) {
    let (client, server) = duplex(8192);
    let (client_recv, client_send) = split(client);
    let (server_recv, server_send) = split(server);
    ((client_send, client_recv), (server_send, server_recv))
}
