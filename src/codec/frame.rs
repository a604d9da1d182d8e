//! Frame buffer for accumulating partial reads.
//!
//! JSON-RPC over a stream transport has no length prefix: messages are
//! delimited purely by balanced JSON structure, with optional whitespace in
//! between. The buffer tracks brace/bracket nesting and string/escape scopes
//! so a frame boundary inside a string literal is never mistaken for a real
//! one.
//!
//! # Example
//!
//! ```
//! use wirerpc::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! let frames = buffer
//!     .push(br#"{"jsonrpc":"2.0","id":1,"result":null} {"jsonrpc":"2.0","method":"ping"}"#)
//!     .unwrap();
//! assert_eq!(frames.len(), 2);
//! ```

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, RpcError};

/// Default maximum size of a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Buffer for accumulating incoming bytes and extracting complete JSON texts.
///
/// Each extracted frame is one top-level JSON value, ready for
/// [`Message::from_json`](crate::Message::from_json). Partial data is kept
/// internally for the next push, and scan state is preserved so re-pushing
/// never rescans bytes already examined.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Number of buffered bytes already scanned.
    scanned: usize,
    /// Current brace/bracket nesting depth.
    depth: usize,
    /// Whether the scan position is inside a string literal.
    in_string: bool,
    /// Whether the previous byte was a backslash inside a string.
    escaped: bool,
    /// Maximum allowed frame size.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default frame size limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom frame size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            scanned: 0,
            depth: 0,
            in_string: false,
            escaped: false,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the frames completed by this push, in arrival order; the
    /// vector is empty while a frame is still fragmented. The same message
    /// sequence is produced however the byte stream is chunked.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Framing`] when the stream cannot contain a valid
    /// frame: a top-level byte that does not open a JSON object or array, or
    /// a frame exceeding the size limit. The buffer is cleared so the session
    /// can synthesize a parse error and keep running.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        loop {
            match self.try_extract_one() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break,
                Err(err) => {
                    self.clear();
                    return Err(err);
                }
            }
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Bytes>> {
        // Between frames: drop inter-message whitespace and check the opener.
        if self.depth == 0 {
            let whitespace = self
                .buffer
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            self.buffer.advance(whitespace);

            match self.buffer.first() {
                None => return Ok(None),
                Some(b'{') | Some(b'[') => {}
                Some(other) => {
                    return Err(RpcError::Framing(format!(
                        "unexpected byte 0x{:02x} at frame start",
                        other
                    )));
                }
            }
        }

        for i in self.scanned..self.buffer.len() {
            let byte = self.buffer[i];

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let frame = self.buffer.split_to(i + 1).freeze();
                        self.scanned = 0;
                        return Ok(Some(frame));
                    }
                }
                _ => {}
            }
        }

        self.scanned = self.buffer.len();
        if self.scanned > self.max_frame_size {
            return Err(RpcError::Framing(format!(
                "frame exceeds maximum size of {} bytes",
                self.max_frame_size
            )));
        }

        Ok(None)
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset the scan state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessageType, WireFormat};

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(br#"{"jsonrpc": "2.0", "id": 1, "method": "service.noParam"}"#)
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());

        let message = Message::from_json(&frames[0]);
        assert_eq!(message.method(), Some("service.noParam"));
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let mut data = Vec::new();
        for i in 1..=3 {
            data.extend_from_slice(
                format!(r#"{{"jsonrpc": "2.0", "id": {}, "result": {}}}"#, i, i).as_bytes(),
            );
        }

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_whitespace_between_frames_skipped() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"  {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":1} \n\t {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":2} \n")
            .unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_byte_at_a_time() {
        let data = br#"{"jsonrpc": "2.0", "id": 42, "method": "m", "params": ["hi"]}"#;
        let mut buffer = FrameBuffer::new();
        let mut all_frames = Vec::new();

        for byte in data.iter() {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(&all_frames[0][..], &data[..]);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let mut buffer = FrameBuffer::new();
        let data = br#"{"jsonrpc": "2.0", "id": 1, "result": "}{][ not a boundary"}"#;
        let frames = buffer.push(data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &data[..]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let mut buffer = FrameBuffer::new();
        let data = br#"{"jsonrpc": "2.0", "id": 1, "result": "quote \" then } brace"}"#;
        let frames = buffer.push(data).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_nested_structures() {
        let mut buffer = FrameBuffer::new();
        let data = br#"{"jsonrpc": "2.0", "id": 1, "params": [[{"a": [1, {"b": 2}]}], {}]}"#;
        let frames = buffer.push(data).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_indented_frames_decode() {
        let message = Message::request_with("service.echo", "hello");
        let data = message.to_json(WireFormat::Indented);

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(Message::from_json(&frames[0]), message);
    }

    #[test]
    fn test_fragmented_then_completed() {
        let data = br#"{"jsonrpc": "2.0", "id": 7, "result": "split across reads"}"#;
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(&data[..20]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.len(), 20);

        let frames = buffer.push(&data[20..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_frame_start_is_error() {
        let mut buffer = FrameBuffer::new();
        let result = buffer.push(b"garbage");
        assert!(matches!(result, Err(RpcError::Framing(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_recovers_after_error() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"oops").is_err());

        let frames = buffer
            .push(br#"{"jsonrpc": "2.0", "id": 1, "result": null}"#)
            .unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_max_frame_size_enforced() {
        let mut buffer = FrameBuffer::with_max_frame_size(16);
        let result = buffer.push(b"{\"key\": \"a long unfinished value");
        assert!(matches!(result, Err(RpcError::Framing(_))));
    }

    #[test]
    fn test_balanced_but_invalid_json_still_frames() {
        // Structure balances, so framing succeeds; classification happens in
        // Message::from_json.
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"{\"dangling\": }").unwrap();
        assert_eq!(frames.len(), 1);

        let message = Message::from_json(&frames[0]);
        assert_eq!(message.message_type(), MessageType::Error);
    }

    #[test]
    fn test_emits_as_many_messages_as_encoded() {
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::request_with("service.echo", format!("payload {}", i)))
            .collect();

        let mut wire = Vec::new();
        for message in &messages {
            wire.extend(message.to_json(WireFormat::Compact));
        }

        // Replay the stream in uneven chunks.
        let mut buffer = FrameBuffer::new();
        let mut decoded = Vec::new();
        for chunk in wire.chunks(17) {
            for frame in buffer.push(chunk).unwrap() {
                decoded.push(Message::from_json(&frame));
            }
        }

        assert_eq!(decoded, messages);
    }
}
