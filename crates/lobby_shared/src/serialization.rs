//! Serialization and deserialization helpers.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Encodes a value with the `bincode` standard configuration.
pub fn encode_to_vec<T>(value: &T) -> Result<Vec<u8>, SerializationError>
where
    T: Serialize,
{
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(SerializationError::BincodeEncode)
}

/// Decodes a value; trailing bytes are ignored. Length prefixes claiming more
/// than `LIMIT` bytes fail before anything is allocated.
pub fn decode_from_slice_with_limit<T, const LIMIT: usize>(
    bytes: &[u8],
) -> Result<T, SerializationError>
where
    T: DeserializeOwned,
{
    let config = bincode::config::standard().with_limit::<LIMIT>();
    let (value, _len) =
        bincode::serde::decode_from_slice(bytes, config).map_err(SerializationError::BincodeDecode)?;
    Ok(value)
}

/// Errors raised while encoding or decoding.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("bincode encode error: {0}")]
    BincodeEncode(bincode::error::EncodeError),
    #[error("bincode decode error: {0}")]
    BincodeDecode(bincode::error::DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_rejects_oversized_length_prefix() {
        let mut bytes = encode_to_vec(&(1u64 << 40)).unwrap();
        bytes.extend_from_slice(b"abc");

        let result = decode_from_slice_with_limit::<String, 64>(&bytes);
        assert!(matches!(result, Err(SerializationError::BincodeDecode(_))));
    }

    #[test]
    fn limit_accepts_values_within_bounds() {
        let bytes = encode_to_vec(&"Room_42".to_string()).unwrap();
        let value: String = decode_from_slice_with_limit::<_, 64>(&bytes).unwrap();
        assert_eq!(value, "Room_42");
    }
}
