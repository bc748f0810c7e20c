//! Message framing for the length-prefixed event stream.
//!
//! Format: [4 bytes big-endian length][payload], repeated. The tracker
//! appends frames to a growing buffer; the transport ships the buffer as-is.

use thiserror::Error;

/// Upper bound on a single framed message
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Errors that can occur during message framing
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("truncated stream: frame wants {0} bytes, {1} remain")]
    Truncated(usize, usize),
}

/// Append a length-prefixed message to a buffer.
pub fn write_frame(out: &mut Vec<u8>, payload: &[u8]) -> Result<(), FramingError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(payload.len(), MAX_MESSAGE_SIZE));
    }
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Split a complete stream into its framed payloads.
pub fn read_frames(mut stream: &[u8]) -> Result<Vec<&[u8]>, FramingError> {
    let mut frames = Vec::new();
    while !stream.is_empty() {
        if stream.len() < 4 {
            return Err(FramingError::Truncated(4, stream.len()));
        }
        let len = u32::from_be_bytes([stream[0], stream[1], stream[2], stream[3]]) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(FramingError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
        }
        let rest = &stream[4..];
        if rest.len() < len {
            return Err(FramingError::Truncated(len, rest.len()));
        }
        frames.push(&rest[..len]);
        stream = &rest[len..];
    }
    Ok(frames)
}
