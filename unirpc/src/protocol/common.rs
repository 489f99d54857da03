// (c) 2026 The unirpc developers

//! Wire encoding and framing
//!
//! Everything that crosses a stream is a [`ProtocolMessage`], encoded with [BARE].
//! On a stream, each message is preceded by a [`MessageHeader`] giving its encoded length.
//!
//! A [`Message`](crate::message::Message) payload delivered to the session is _not_ framed:
//! framing belongs to the transport, which hands the session exactly one payload.
//!
//! [BARE]: https://www.ietf.org/archive/id/draft-devault-bare-11.html

use bytes::BytesMut;
use serde_bare::error::Error as BareError;
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};

/// Marker trait for the sending half of a stream
pub trait SendingStream: AsyncWrite + Send + Unpin + 'static {}
impl<T: AsyncWrite + Send + Unpin + 'static> SendingStream for T {}

/// Marker trait for the receiving half of a stream
pub trait ReceivingStream: AsyncRead + Send + Unpin + 'static {}
impl<T: AsyncRead + Send + Unpin + 'static> ReceivingStream for T {}

/// Length prefix sent before every framed message
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct MessageHeader {
    /// Length of the encoded message that follows
    pub size: u32,
}

impl MessageHeader {
    /// Encoded length of a header. BARE encodes a `u32` as four little-endian bytes,
    /// so this can never change without breaking the protocol.
    pub const SIZE: usize = 4;
}
impl ProtocolMessage for MessageHeader {}

/// A message was larger than its type allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{type_name} of {size} bytes exceeds its limit of {limit}")]
pub struct WireSizeError {
    /// Encoded size of the offending message
    pub size: usize,
    /// The limit that applied
    pub limit: u32,
    /// Name of the message type
    pub type_name: &'static str,
}

/// Encoding, decoding and framing for every type that goes on the wire.
///
/// Implementors usually provide nothing, or at most a tighter
/// [`WIRE_ENCODING_LIMIT`](Self::WIRE_ENCODING_LIMIT).
pub trait ProtocolMessage
where
    Self: serde::Serialize + serde::de::DeserializeOwned + Sync,
{
    /// Largest encoding of this type that will be sent or accepted, in bytes.
    ///
    /// <div class="warning">
    /// This bounds what a corrupt or hostile length prefix can make us allocate.
    /// Raise it with care.
    /// </div>
    const WIRE_ENCODING_LIMIT: u32 = 1_048_576;

    /// Checks an encoded length against [`WIRE_ENCODING_LIMIT`](Self::WIRE_ENCODING_LIMIT)
    fn check_size(size: usize) -> Result<(), WireSizeError> {
        if u32::try_from(size).is_ok_and(|s| s <= Self::WIRE_ENCODING_LIMIT) {
            return Ok(());
        }
        Err(WireSizeError {
            size,
            limit: Self::WIRE_ENCODING_LIMIT,
            type_name: std::any::type_name::<Self>(),
        })
    }

    /// Decodes from exactly the bytes of one encoded message
    fn from_slice(slice: &[u8]) -> Result<Self, BareError> {
        serde_bare::from_slice(slice)
    }

    /// Encodes without framing
    fn to_vec(&self) -> Result<Vec<u8>, BareError> {
        serde_bare::to_vec(self)
    }

    /// Reads one framed message.
    ///
    /// The length prefix is checked against the limit before any of the payload is read.
    /// A stream that ends early fails with an [`std::io::Error`] of kind `UnexpectedEof`.
    fn read_framed<R>(reader: &mut R) -> impl Future<Output = anyhow::Result<Self>> + Send
    where
        R: AsyncRead + Unpin + Send,
    {
        async {
            let mut header = [0u8; MessageHeader::SIZE];
            let _ = reader.read_exact(&mut header).await?;
            let size = usize::try_from(MessageHeader::from_slice(&header)?.size)?;
            Self::check_size(size)?;
            let mut payload = BytesMut::zeroed(size);
            let _ = reader.read_exact(&mut payload).await?;
            Ok(Self::from_slice(&payload)?)
        }
    }

    /// Writes this message and its length prefix. Nothing is written if the message is too large.
    fn write_framed<W>(&self, writer: &mut W) -> impl Future<Output = anyhow::Result<()>> + Send
    where
        W: AsyncWrite + Unpin + Send,
    {
        async move {
            let body = self.to_vec()?;
            Self::check_size(body.len())?;
            let mut frame = MessageHeader {
                size: u32::try_from(body.len())?,
            }
            .to_vec()?;
            frame.extend_from_slice(&body);
            writer.write_all(&frame).await?;
            Ok(())
        }
    }
}
