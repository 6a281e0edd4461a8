/*
 * Serial Interface Protocol
 *
 * Framed hex commands over a byte stream. Wire format:
 *
 *   '<' CC LL (PP x LL) KK T
 *
 * Every field is two ASCII hex digits, high nibble first. CC is the command,
 * LL the payload length, PP the payload bytes and KK the checksum. T is one
 * arbitrary trailing byte, conventionally '>'.
 *
 * Neither the checksum nor the trailing byte is verified. Both are handed to
 * callers on the completed Frame.
 */

#![cfg_attr(not(test), no_std)]

use core::fmt;

pub mod commands;
pub mod decoder;
pub mod hex;
pub mod protocol;

pub use commands::{CommandHandler, CommandTable, Dispatch};
pub use decoder::{Decoder, Frame, State, Step};
pub use protocol::Protocol;

pub const START_MARKER: u8 = b'<';
pub const END_MARKER: u8 = b'>';

/* Payload buffer capacity; the one-byte length field tops out at 255 */
pub const PAYLOAD_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
	/* A field byte that is not 0-9, A-F or a-f; it decoded as zero */
	InvalidHexDigit(u8),
	/* encode_frame was handed more than 255 payload bytes */
	PayloadTooLong(usize),
}

impl fmt::Display for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FrameError::InvalidHexDigit(b) => write!(f, "invalid hex digit {:#04x}", b),
			FrameError::PayloadTooLong(n) => write!(f, "payload of {} bytes does not fit a frame", n),
		}
	}
}

/*
 * encode_frame - Emit the wire bytes for one frame into @sink
 * @command: Command identifier
 * @payload: At most 255 bytes
 * @checksum: Sent as-is; the receiver does not check it
 *
 * Hex digits are upper case and the frame ends with END_MARKER.
 */
pub fn encode_frame(
	command: u8,
	payload: &[u8],
	checksum: u8,
	mut sink: impl FnMut(u8),
) -> Result<(), FrameError> {
	let len = u8::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLong(payload.len()))?;

	sink(START_MARKER);
	let mut put_hex = |byte: u8| {
		sink(hex::encode_nibble(byte >> 4));
		sink(hex::encode_nibble(byte & 0xF));
	};
	put_hex(command);
	put_hex(len);
	for &byte in payload {
		put_hex(byte);
	}
	put_hex(checksum);

	sink(END_MARKER);
	Ok(())
}
