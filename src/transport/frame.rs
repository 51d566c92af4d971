//! Event frame encoding
//!
//! The wire-level unit written to a streaming client carries one payload as
//! `data: <payload>\n\n`, written and flushed as a unit. The exact byte
//! layout is the interoperability contract with standard event-stream
//! consumers.

use bytes::{BufMut, Bytes, BytesMut};

/// Prefix of every event frame.
const PREFIX: &[u8] = b"data: ";

/// Terminator of every event frame.
const TERMINATOR: &[u8] = b"\n\n";

/// Encode one payload as an event frame.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(PREFIX.len() + payload.len() + TERMINATOR.len());

    frame.put_slice(PREFIX);
    frame.put_slice(payload);
    frame.put_slice(TERMINATOR);

    frame.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(b"hello world").as_ref(), b"data: hello world\n\n");
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode(b"").as_ref(), b"data: \n\n");
    }

    #[test]
    fn test_encode_binary_payload() {
        let frame = encode(&[0x00, 0xFF, 0x7F]);

        assert_eq!(frame.as_ref(), b"data: \x00\xFF\x7F\n\n");
    }
}
