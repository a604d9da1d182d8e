//! Codec module - streaming frame extraction for the JSON wire format.
//!
//! Decoding is handled by [`FrameBuffer`], which turns an arbitrarily
//! fragmented byte stream into discrete JSON texts. Encoding is the inverse
//! walk through [`Message::to_json`](crate::Message::to_json): the session
//! serializes a message in its selected [`WireFormat`](crate::WireFormat) and
//! writes the bytes whole.

mod frame;

pub use frame::{FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
