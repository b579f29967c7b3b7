use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Per-datagram receive budget shared by the manager and every peer socket.
pub const MAX_DATAGRAM_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message")]
    Encode(#[source] serde_json::Error),
    #[error("message of {0} bytes exceeds the {MAX_DATAGRAM_BYTES}-byte datagram budget")]
    TooLarge(usize),
    #[error("failed to decode message")]
    Decode(#[from] serde_json::Error),
}

/// Encode a message as JSON, refusing anything that would not fit in one
/// datagram rather than silently truncating it.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let bytes = serde_json::to_vec(value).map_err(CodecError::Encode)?;
    if bytes.len() > MAX_DATAGRAM_BYTES {
        return Err(CodecError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode a message previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManagerRequest;

    #[test]
    fn round_trips_within_budget() {
        let request = ManagerRequest::Register {
            peer_name: "apple".to_string(),
            ipv4_address: "127.0.0.1".to_string(),
            m_port: 15001,
            p_port: 15002,
        };

        let bytes = encode(&request).unwrap();
        assert!(bytes.len() <= MAX_DATAGRAM_BYTES);

        let decoded: ManagerRequest = decode(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn rejects_oversized_payloads() {
        let request = ManagerRequest::Deregister {
            peer_name: "x".repeat(MAX_DATAGRAM_BYTES),
        };

        let err = encode(&request).unwrap_err();
        assert!(matches!(err, CodecError::TooLarge(_)));
    }

    #[test]
    fn decode_reports_malformed_input() {
        let err = decode::<ManagerRequest>(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
