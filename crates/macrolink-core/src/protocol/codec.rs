//! Length-prefixed framing and JSON message codec.
//!
//! Wire format of every frame:
//! ```text
//! [payload_len:4][payload:N]
//! ```
//! `payload_len` is a big-endian `u32`.  After the handshake the payload is a
//! UTF-8 JSON [`WireMessage`]; during the handshake it is a bare text token.
//!
//! TCP delivers a byte stream, not messages: one `read()` may return half a
//! frame or three frames at once.  [`FrameBuffer`] accumulates bytes across
//! reads and hands out complete frames one at a time, so the caller never
//! has to assume that a read boundary is a message boundary.

use thiserror::Error;

use crate::protocol::messages::{WireMessage, KNOWN_TYPES};

/// Size of the big-endian length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound on a single frame's payload.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

/// Errors that can occur while framing, encoding or decoding a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The payload is not valid JSON or does not match the message schema.
    #[error("malformed message payload: {0}")]
    Malformed(String),

    /// The payload is well-formed JSON but names a `type` we do not handle.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    /// A message could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// A frame's declared length exceeds the configured limit.
    #[error("frame of {declared} bytes exceeds the {limit}-byte limit")]
    FrameTooLarge { declared: usize, limit: usize },
}

// ── Framing ───────────────────────────────────────────────────────────────────

/// Prepends the 4-byte length header to `payload`.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] when `payload` exceeds `max_frame_len`.
pub fn encode_frame(payload: &[u8], max_frame_len: usize) -> Result<Vec<u8>, CodecError> {
    let limit = max_frame_len.min(u32::MAX as usize);
    if payload.len() > limit {
        return Err(CodecError::FrameTooLarge {
            declared: payload.len(),
            limit,
        });
    }

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Accumulates stream bytes and yields complete frame payloads.
///
/// # Examples
///
/// ```rust
/// use macrolink_core::protocol::codec::{encode_frame, FrameBuffer};
///
/// let frame = encode_frame(b"hello", 1024).unwrap();
/// let mut buf = FrameBuffer::new(1024);
///
/// buf.extend(&frame[..3]);
/// assert_eq!(buf.next_frame().unwrap(), None);
///
/// buf.extend(&frame[3..]);
/// assert_eq!(buf.next_frame().unwrap(), Some(b"hello".to_vec()));
/// ```
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    max_frame_len: usize,
}

impl FrameBuffer {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame_len,
        }
    }

    /// Appends freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete payload, or `None` if more bytes
    /// are needed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::FrameTooLarge`] as soon as a header announcing an
    /// oversized payload is visible; the buffer cannot be resynchronised after
    /// that.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        if self.buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let declared =
            u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if declared > self.max_frame_len {
            return Err(CodecError::FrameTooLarge {
                declared,
                limit: self.max_frame_len,
            });
        }

        let total = LENGTH_PREFIX_SIZE + declared;
        if self.buf.len() < total {
            return Ok(None);
        }

        let payload = self.buf[LENGTH_PREFIX_SIZE..total].to_vec();
        self.buf.drain(..total);
        Ok(Some(payload))
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

// ── Message payloads ──────────────────────────────────────────────────────────

/// Serialises a message to its JSON payload (without the length header).
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode_message(msg: &WireMessage) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(msg).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Parses one JSON payload into a [`WireMessage`].
///
/// An unrecognised `type` is reported as [`CodecError::UnknownType`] rather
/// than a generic schema error so the session loop can log it distinctly.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] or [`CodecError::UnknownType`].
pub fn decode_message(payload: &[u8]) -> Result<WireMessage, CodecError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| CodecError::Malformed(e.to_string()))?;

    let type_name = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CodecError::Malformed("missing string field \"type\"".to_string()))?;

    if !KNOWN_TYPES.contains(&type_name) {
        return Err(CodecError::UnknownType(type_name.to_string()));
    }

    serde_json::from_value(value).map_err(|e| CodecError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        encode_frame(payload, DEFAULT_MAX_FRAME_LEN).unwrap()
    }

    #[test]
    fn test_encode_frame_prefixes_big_endian_length() {
        let bytes = frame(b"abc");
        assert_eq!(&bytes[..4], &[0, 0, 0, 3]);
        assert_eq!(&bytes[4..], b"abc");
    }

    #[test]
    fn test_encode_frame_rejects_oversized_payload() {
        let result = encode_frame(&[0u8; 11], 10);
        assert_eq!(
            result,
            Err(CodecError::FrameTooLarge {
                declared: 11,
                limit: 10
            })
        );
    }

    #[test]
    fn test_frame_buffer_waits_for_complete_header() {
        // Arrange
        let mut buf = FrameBuffer::new(DEFAULT_MAX_FRAME_LEN);
        buf.extend(&[0, 0]);

        // Act / Assert
        assert_eq!(buf.next_frame().unwrap(), None);
        assert_eq!(buf.pending_len(), 2);
    }

    #[test]
    fn test_frame_buffer_reassembles_byte_by_byte() {
        // Arrange
        let bytes = frame(b"{\"type\":\"exit\"}");
        let mut buf = FrameBuffer::new(DEFAULT_MAX_FRAME_LEN);

        // Act – feed one byte at a time; only the last byte completes the frame
        let mut frames = Vec::new();
        for b in &bytes {
            buf.extend(std::slice::from_ref(b));
            if let Some(f) = buf.next_frame().unwrap() {
                frames.push(f);
            }
        }

        // Assert
        assert_eq!(frames, vec![b"{\"type\":\"exit\"}".to_vec()]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn test_frame_buffer_splits_back_to_back_frames() {
        // Arrange – two frames plus the start of a third in one "read"
        let mut bytes = frame(b"one");
        bytes.extend(frame(b"two"));
        let third = frame(b"three");
        bytes.extend(&third[..5]);
        let mut buf = FrameBuffer::new(DEFAULT_MAX_FRAME_LEN);
        buf.extend(&bytes);

        // Act / Assert
        assert_eq!(buf.next_frame().unwrap(), Some(b"one".to_vec()));
        assert_eq!(buf.next_frame().unwrap(), Some(b"two".to_vec()));
        assert_eq!(buf.next_frame().unwrap(), None);

        buf.extend(&third[5..]);
        assert_eq!(buf.next_frame().unwrap(), Some(b"three".to_vec()));
    }

    #[test]
    fn test_frame_buffer_accepts_empty_payload() {
        let mut buf = FrameBuffer::new(DEFAULT_MAX_FRAME_LEN);
        buf.extend(&frame(b""));
        assert_eq!(buf.next_frame().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_frame_buffer_rejects_oversized_header_before_payload_arrives() {
        let mut buf = FrameBuffer::new(16);
        buf.extend(&1000u32.to_be_bytes());
        assert!(matches!(
            buf.next_frame(),
            Err(CodecError::FrameTooLarge { declared: 1000, limit: 16 })
        ));
    }

    #[test]
    fn test_decode_message_reports_unknown_type() {
        let result = decode_message(br#"{"type":"scroll","data":3}"#);
        assert_eq!(result, Err(CodecError::UnknownType("scroll".to_string())));
    }

    #[test]
    fn test_decode_message_reports_malformed_json() {
        assert!(matches!(
            decode_message(b"{\"type\":\"text\""),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_message_reports_missing_type() {
        assert!(matches!(
            decode_message(br#"{"data":"x"}"#),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_message_reports_schema_mismatch_as_malformed() {
        assert!(matches!(
            decode_message(br#"{"type":"mouse_move","data":{"x":"left"}}"#),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_encode_then_decode_sync_message() {
        use crate::domain::{action::Action, hotkey::Hotkey, transaction::Transaction};

        // Arrange
        let msg = WireMessage::SyncMacros(vec![
            Transaction::add(Hotkey::parse("a+b").unwrap(), vec![Action::Exit]),
            Transaction::delete(Hotkey::parse("a+b").unwrap()),
        ]);

        // Act
        let decoded = decode_message(&encode_message(&msg).unwrap()).unwrap();

        // Assert
        assert_eq!(decoded, msg);
    }
}
