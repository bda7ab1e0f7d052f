//! Codec trait and implementations for serializing/deserializing events.
//!
//! The gateway doesn't care how events become bytes; it goes through the
//! [`Codec`] trait. [`JsonCodec`] is the only current implementation:
//! browser clients speak JSON and it keeps frames inspectable in DevTools.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between event types and raw frame bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use mineclash_protocol::{Codec, JsonCodec, ClientEvent};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ClientEvent::TileReveal { x: 3, y: 4 }).unwrap();
/// let decoded: ClientEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ClientEvent::TileReveal { x: 3, y: 4 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
