//! Typed request and response messages
// (c) 2026 The unirpc developers

use bytes::Bytes;

use crate::{
    AppError, Status, StatusCode,
    protocol::common::{ProtocolMessage, WireSizeError},
};

/// A strongly-typed message that can be decoded from, and encoded to, a single raw payload.
///
/// Failures are reported as [`AppError`], so a codec may choose a precise status for
/// some failures (raise [`AppError::Status`]) and leave the rest as generic errors,
/// which the session reports as `internal`.
///
/// This is implemented for every [`ProtocolMessage`], which is the easiest way to get it:
/// derive `Serialize` and `Deserialize`, then `impl ProtocolMessage for MyType {}`.
pub trait Message: Sized + Send + 'static {
    /// Decodes a received payload
    fn decode(data: &[u8]) -> Result<Self, AppError>;
    /// Encodes this message for sending
    fn encode(&self) -> Result<Bytes, AppError>;
}

/// Plain strings are handy for simple methods and for tests
impl ProtocolMessage for String {}

fn size_status(e: &WireSizeError) -> Status {
    Status::new(StatusCode::ResourceExhausted, e.to_string())
}

impl<T> Message for T
where
    T: ProtocolMessage + Send + 'static,
{
    fn decode(data: &[u8]) -> Result<Self, AppError> {
        Self::check_size(data.len()).map_err(|e| size_status(&e))?;
        Self::from_slice(data).map_err(|e| {
            AppError::Generic(
                anyhow::Error::new(e)
                    .context(format!("decoding {}", std::any::type_name::<Self>())),
            )
        })
    }

    fn encode(&self) -> Result<Bytes, AppError> {
        let vec = self.to_vec().map_err(|e| {
            AppError::Generic(
                anyhow::Error::new(e)
                    .context(format!("encoding {}", std::any::type_name::<Self>())),
            )
        })?;
        Self::check_size(vec.len()).map_err(|e| size_status(&e))?;
        Ok(Bytes::from(vec))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::Message;
    use crate::{AppError, StatusCode, protocol::common::ProtocolMessage};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Small {
        name: String,
    }
    impl ProtocolMessage for Small {
        const WIRE_ENCODING_LIMIT: u32 = 8;
    }

    #[test]
    fn roundtrip() {
        let msg = Small {
            name: "x".to_string(),
        };
        let bytes = msg.encode().unwrap();
        assert_eq!(&bytes[..], &[1, b'x']);
        assert_eq!(Small::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn malformed_payload_is_generic() {
        // length 5, then only one byte of string
        let err = Small::decode(&[5, b'a']).unwrap_err();
        let AppError::Generic(e) = err else {
            panic!("expected a generic error");
        };
        assert_contains!(format!("{e:#}"), "decoding");
    }

    #[test]
    fn oversize_payload_is_resource_exhausted() {
        let AppError::Status(st) = Small::decode(&[0u8; 9]).unwrap_err() else {
            panic!("expected a status");
        };
        assert_eq!(st.code(), StatusCode::ResourceExhausted);

        let big = Small {
            name: "much too long for the limit".to_string(),
        };
        let AppError::Status(st) = big.encode().unwrap_err() else {
            panic!("expected a status");
        };
        assert_eq!(st.code(), StatusCode::ResourceExhausted);
    }
}
