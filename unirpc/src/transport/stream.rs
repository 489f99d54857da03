// (c) 2026 The unirpc developers

//! Carries a single call over an async byte stream pair
//!
//! See the [protocol module](crate::protocol) for the frame sequence.
//!
//! The server side is [`StreamCall`]; [`invoke`] is a minimal client.
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Context as _, Result, bail};
use bytes::Bytes;
use tokio::{
    io::{AsyncWriteExt as _, ErrorKind},
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use super::{CallHandler, CallOutcome, ReceiveCallback, SendCallback};
use crate::{
    Metadata, Status, TransportError,
    protocol::{
        call::{ClientFrame, ServerFrame},
        common::{ProtocolMessage as _, ReceivingStream, SendingStream},
    },
};

type Outgoing = (ServerFrame, Option<SendCallback>);

enum Reader {
    Ready(Box<dyn ReceivingStream>),
    /// The client closed the stream before sending anything
    Eof,
    Taken,
}

fn is_eof(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::UnexpectedEof)
}

fn transport_error(e: anyhow::Error) -> TransportError {
    match e.downcast::<std::io::Error>() {
        Ok(io) => TransportError::Io(io),
        Err(e) => TransportError::Protocol(format!("{e:#}").into()),
    }
}

/// The server side of a call carried over a stream pair.
///
/// Outgoing frames are written in order by a dedicated task, which closes the
/// sending stream after the status frame.
pub struct StreamCall {
    request_metadata: Metadata,
    runtime: Handle,
    reader: Mutex<Reader>,
    frames: mpsc::UnboundedSender<Outgoing>,
    finished: AtomicBool,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for StreamCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCall")
            .field("request_metadata", &self.request_metadata)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl StreamCall {
    /// Accepts a call: reads the client's metadata frame, and starts the writer task.
    ///
    /// A client that closes the stream without sending anything is treated as having sent
    /// empty metadata and no request.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn accept<S, R>(send: S, mut recv: R) -> Result<Arc<Self>, TransportError>
    where
        S: SendingStream,
        R: ReceivingStream,
    {
        let runtime = Handle::try_current().map_err(std::io::Error::other)?;
        let (request_metadata, reader) = match ClientFrame::read_framed(&mut recv).await {
            Ok(ClientFrame::Metadata(md)) => (md, Reader::Ready(Box::new(recv))),
            Ok(other) => {
                return Err(TransportError::Protocol(
                    format!("expected Metadata frame, got {other}").into(),
                ));
            }
            Err(e) if is_eof(&e) => {
                debug!("client closed the stream before sending metadata");
                (Metadata::new(), Reader::Eof)
            }
            Err(e) => return Err(transport_error(e)),
        };
        trace!("request metadata: {request_metadata}");

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = runtime.spawn(write_frames(send, rx));
        Ok(Arc::new(Self {
            request_metadata,
            runtime,
            reader: Mutex::new(reader),
            frames: tx,
            finished: AtomicBool::new(false),
            writer: Mutex::new(Some(writer)),
        }))
    }

    /// Waits until the status frame has been written and the sending stream closed.
    ///
    /// Only the first caller waits; later calls return immediately.
    pub async fn closed(&self) {
        let handle = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!("writer task failed: {e}");
        }
    }

    fn reader(&self) -> MutexGuard<'_, Reader> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, frame: ServerFrame, on_sent: Option<SendCallback>) -> Result<(), TransportError> {
        self.frames
            .send((frame, on_sent))
            .map_err(|_| TransportError::Closed)
    }
}

async fn read_request(mut reader: Box<dyn ReceivingStream>) -> Option<Bytes> {
    match ClientFrame::read_framed(&mut reader).await {
        Ok(ClientFrame::Message(data)) => Some(Bytes::from(data)),
        Ok(ClientFrame::HalfClose) => {
            debug!("client half-closed without a request");
            None
        }
        Ok(other) => {
            warn!("protocol error: expected Message, got {other}");
            None
        }
        Err(e) if is_eof(&e) => {
            debug!("client closed the stream without a request");
            None
        }
        Err(e) => {
            warn!("reading request: {e:#}");
            None
        }
    }
}

async fn write_frames<S: SendingStream>(
    mut send: S,
    mut frames: mpsc::UnboundedReceiver<Outgoing>,
) {
    while let Some((frame, on_sent)) = frames.recv().await {
        let is_status = matches!(frame, ServerFrame::Status(_));
        trace!("sending {frame}");
        let result = match frame.write_framed(&mut send).await {
            Ok(()) => send.flush().await.map_err(TransportError::from),
            Err(e) => Err(transport_error(e)),
        };
        match (on_sent, result) {
            (Some(cb), r) => cb(r.err()),
            (None, Err(e)) => warn!("sending {}: {e}", if is_status { "status" } else { "frame" }),
            (None, Ok(())) => (),
        }
        if is_status {
            break;
        }
    }
    frames.close();
    if let Err(e) = send.shutdown().await {
        debug!("closing stream: {e}");
    }
}

impl CallHandler for StreamCall {
    fn request_metadata(&self) -> Metadata {
        self.request_metadata.clone()
    }

    fn receive_message(
        &self,
        initial_metadata: Metadata,
        on_received: ReceiveCallback,
    ) -> Result<(), TransportError> {
        let reader = std::mem::replace(&mut *self.reader(), Reader::Taken);
        if matches!(reader, Reader::Taken) {
            return Err(TransportError::AlreadyReceived);
        }
        if self.finished.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.enqueue(ServerFrame::InitialMetadata(initial_metadata), None)?;
        drop(self.runtime.spawn(async move {
            let payload = match reader {
                Reader::Ready(r) => read_request(r).await,
                Reader::Eof | Reader::Taken => None,
            };
            on_received(payload);
        }));
        Ok(())
    }

    fn send_message(&self, data: Bytes, on_sent: SendCallback) -> Result<(), TransportError> {
        if self.finished.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.enqueue(ServerFrame::Message(data.to_vec()), Some(on_sent))
    }

    fn send_status(&self, status: Status) -> Result<(), TransportError> {
        if self.finished.swap(true, Ordering::AcqRel) {
            return Err(TransportError::Closed);
        }
        self.enqueue(ServerFrame::Status(status.into()), None)
    }
}

/// Makes a unary call over a stream pair, as a client.
///
/// Sends `metadata`, then either the request payload or (if `payload` is `None`) a half-close,
/// then reads the server's frames until the status arrives.
pub async fn invoke<S, R>(
    mut send: S,
    mut recv: R,
    metadata: Metadata,
    payload: Option<Bytes>,
) -> Result<CallOutcome>
where
    S: SendingStream,
    R: ReceivingStream,
{
    ClientFrame::Metadata(metadata)
        .write_framed(&mut send)
        .await
        .context("sending metadata")?;
    let request = match payload {
        Some(p) => ClientFrame::Message(p.to_vec()),
        None => ClientFrame::HalfClose,
    };
    request
        .write_framed(&mut send)
        .await
        .context("sending request")?;
    send.flush().await?;

    let mut initial_metadata = Metadata::new();
    let mut message = None;
    loop {
        let frame = ServerFrame::read_framed(&mut recv)
            .await
            .context("reading response")?;
        trace!("received {frame}");
        match frame {
            ServerFrame::InitialMetadata(md) => initial_metadata = md,
            ServerFrame::Message(m) => {
                if message.is_some() {
                    bail!("protocol error: server sent more than one message");
                }
                message = Some(Bytes::from(m));
            }
            ServerFrame::Status(st) => {
                return Ok(CallOutcome {
                    initial_metadata,
                    message,
                    status: st.into(),
                });
            }
        }
    }
}
