//! LAN session advertisements.
//!
//! Packet format hosts broadcast to make their session visible, plus the
//! encoder used by the announcer and the decoder used by the listener.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    serialization::{decode_from_slice_with_limit, encode_to_vec, SerializationError},
    session::SessionRecord,
};

/// Magic bytes identifying session packets.
pub const LOBBY_DISCOVERY_MAGIC: &[u8; 8] = b"LOBBYAD1";

/// Largest packet a listener receives. Encoded advertisements must fit, and
/// decoding never claims more than this many bytes.
pub const MAX_ADVERTISEMENT_SIZE: usize = 1024;

/// Packet format version.
pub type ProtocolVersion = u16;

/// Current version; packets with any other version are dropped.
pub const CURRENT_PROTOCOL_VERSION: ProtocolVersion = 1;

/// Packet a host broadcasts periodically to announce its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAdvertisement {
    pub version: ProtocolVersion,
    /// Port on which the host accepts players.
    pub port: u16,
    pub record: SessionRecord,
}

impl SessionAdvertisement {
    /// Creates an advertisement with the current protocol version.
    pub fn new(port: u16, record: SessionRecord) -> Self {
        Self {
            version: CURRENT_PROTOCOL_VERSION,
            port,
            record,
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.version == CURRENT_PROTOCOL_VERSION
    }
}

/// Errors while encoding an advertisement.
#[derive(Debug, Error)]
pub enum AdvertisementEncodeError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("advertisement is {size} bytes, listeners accept at most {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Encodes an advertisement including the magic bytes. Fails if the packet
/// would not fit into a listener's receive buffer.
pub fn encode_advertisement(
    advertisement: &SessionAdvertisement,
) -> Result<Vec<u8>, AdvertisementEncodeError> {
    let mut payload = Vec::with_capacity(64);
    payload.extend_from_slice(LOBBY_DISCOVERY_MAGIC);
    payload.extend_from_slice(&encode_to_vec(advertisement)?);
    if payload.len() > MAX_ADVERTISEMENT_SIZE {
        return Err(AdvertisementEncodeError::TooLarge {
            size: payload.len(),
            limit: MAX_ADVERTISEMENT_SIZE,
        });
    }
    Ok(payload)
}

/// Errors while decoding a session packet.
#[derive(Debug, Error)]
pub enum AdvertisementDecodeError {
    #[error("invalid discovery magic")]
    InvalidMagic,
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Decodes a session packet (magic check included). The input is untrusted,
/// so decoding is bounded by [`MAX_ADVERTISEMENT_SIZE`].
pub fn decode_advertisement(
    bytes: &[u8],
) -> Result<SessionAdvertisement, AdvertisementDecodeError> {
    let Some(payload) = bytes.strip_prefix(LOBBY_DISCOVERY_MAGIC.as_slice()) else {
        return Err(AdvertisementDecodeError::InvalidMagic);
    };
    Ok(decode_from_slice_with_limit::<_, MAX_ADVERTISEMENT_SIZE>(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_roundtrip() {
        let advertisement =
            SessionAdvertisement::new(7777, SessionRecord::new("Room_42", "eu", 3, 10));

        let encoded = encode_advertisement(&advertisement).unwrap();
        assert!(encoded.starts_with(LOBBY_DISCOVERY_MAGIC));

        let decoded = decode_advertisement(&encoded).unwrap();
        assert_eq!(decoded, advertisement);
        assert!(decoded.is_compatible());
    }

    #[test]
    fn foreign_packets_are_rejected_by_magic() {
        assert!(matches!(
            decode_advertisement(b"FOSDISC1whatever"),
            Err(AdvertisementDecodeError::InvalidMagic)
        ));
        assert!(matches!(
            decode_advertisement(b"LOB"),
            Err(AdvertisementDecodeError::InvalidMagic)
        ));
    }

    #[test]
    fn truncated_payload_is_a_serialization_error() {
        let advertisement =
            SessionAdvertisement::new(7777, SessionRecord::new("Room_42", "eu", 3, 10));
        let encoded = encode_advertisement(&advertisement).unwrap();

        let truncated = &encoded[..encoded.len() - 4];
        assert!(matches!(
            decode_advertisement(truncated),
            Err(AdvertisementDecodeError::Serialization(_))
        ));
    }

    #[test]
    fn huge_length_prefix_is_rejected_without_allocating() {
        // version, port, then a name claiming 2^40 bytes.
        let mut packet = LOBBY_DISCOVERY_MAGIC.to_vec();
        packet.extend_from_slice(&encode_to_vec(&(1u16, 7777u16, 1u64 << 40)).unwrap());
        packet.extend_from_slice(b"abc");

        assert!(matches!(
            decode_advertisement(&packet),
            Err(AdvertisementDecodeError::Serialization(_))
        ));
    }

    #[test]
    fn oversized_advertisement_is_not_encoded() {
        let name = "x".repeat(MAX_ADVERTISEMENT_SIZE);
        let advertisement = SessionAdvertisement::new(7777, SessionRecord::new(name, "eu", 1, 10));

        match encode_advertisement(&advertisement) {
            Err(AdvertisementEncodeError::TooLarge { size, limit }) => {
                assert!(size > limit);
                assert_eq!(limit, MAX_ADVERTISEMENT_SIZE);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn largest_accepted_advertisement_roundtrips() {
        let base = SessionAdvertisement::new(7777, SessionRecord::new("", "eu", 1, 10));
        let overhead = encode_advertisement(&base).unwrap().len();
        // Name length prefix grows from one to three bytes past 250.
        let name = "n".repeat(MAX_ADVERTISEMENT_SIZE - overhead - 2);
        let advertisement = SessionAdvertisement::new(7777, SessionRecord::new(name, "eu", 1, 10));

        let encoded = encode_advertisement(&advertisement).unwrap();
        assert_eq!(encoded.len(), MAX_ADVERTISEMENT_SIZE);
        assert_eq!(decode_advertisement(&encoded).unwrap(), advertisement);
    }
}
