use core::fmt;

#[cfg(feature = "trace")]
use hal::log_debug;

use crate::hex::decode_nibble;
use crate::{FrameError, PAYLOAD_CAPACITY, START_MARKER};

#[cfg(feature = "trace")]
const LOG_ORIGIN: &str = "sip";

/* Decoder position; each data state consumes one hex digit */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	Idle,
	StartSeen,
	CmdHigh,
	CmdLow,
	LenHigh,
	LenLow,
	PayloadHigh,
	PayloadLow,
	ChkHigh,
	ChkLow,
	EndFlag,
}

impl fmt::Display for State {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/* A completed frame, copied out of the decoder */
#[derive(Clone, Copy)]
pub struct Frame {
	command: u8,
	len: u8,
	payload: [u8; PAYLOAD_CAPACITY],
	checksum: u8,
	trailer: u8,
	error: Option<FrameError>,
}

impl Frame {
	pub fn command(&self) -> u8 {
		self.command
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload[..self.len as usize]
	}

	pub fn len(&self) -> usize {
		self.len as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/* As received; nothing compares it against the payload */
	pub fn checksum(&self) -> u8 {
		self.checksum
	}

	/* The byte that closed the frame, normally '>' but never checked */
	pub fn trailer(&self) -> u8 {
		self.trailer
	}

	/* First bad hex digit seen while the frame was assembled */
	pub fn error(&self) -> Option<FrameError> {
		self.error
	}
}

impl fmt::Debug for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Frame")
			.field("command", &self.command)
			.field("payload", &self.payload())
			.field("checksum", &self.checksum)
			.field("trailer", &self.trailer)
			.field("error", &self.error)
			.finish()
	}
}

/* Outcome of feeding one byte */
#[derive(Debug, Clone, Copy)]
pub enum Step {
	/* Outside a frame and not a start marker: dropped */
	Idle,
	Advanced(State),
	/* Non-hex digit, taken as zero; the frame carries on in @state */
	Malformed { byte: u8, state: State },
	Complete(Frame),
}

/*
 * struct Decoder - Byte-at-a-time frame reassembly
 *
 * A start marker resets the machine from any state, which is the only
 * recovery: a broken frame is dropped once the next '<' arrives.
 */
pub struct Decoder {
	state: State,
	command: u8,
	len: u8,
	payload: [u8; PAYLOAD_CAPACITY],
	count: u8,
	checksum: u8,
	error: Option<FrameError>,
}

impl Default for Decoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Decoder {
	pub const fn new() -> Self {
		Decoder {
			state: State::Idle,
			command: 0,
			len: 0,
			payload: [0; PAYLOAD_CAPACITY],
			count: 0,
			checksum: 0,
			error: None,
		}
	}

	pub fn state(&self) -> State {
		self.state
	}

	/* Decode error of the frame in progress, cleared by the next '<' */
	pub fn error(&self) -> Option<FrameError> {
		self.error
	}

	/* Abandon any partial frame */
	pub fn reset(&mut self) {
		self.state = State::Idle;
		self.count = 0;
		self.error = None;
	}

	/*
	 * feed - Advance the machine by one byte
	 *
	 * A start marker always begins a new frame, whatever state the machine
	 * is in. In EndFlag any byte at all completes the frame.
	 */
	pub fn feed(&mut self, byte: u8) -> Step {
		if byte == START_MARKER {
			self.state = State::StartSeen;
			self.count = 0;
			self.error = None;
		}

		let from = self.state;
		let mut bad_digit = false;
		let mut nibble = || match decode_nibble(byte) {
			Some(n) => n,
			None => {
				bad_digit = true;
				0
			}
		};

		let next = match from {
			State::Idle => return Step::Idle,
			State::StartSeen => State::CmdHigh,
			State::CmdHigh => {
				self.command = nibble() << 4;
				State::CmdLow
			}
			State::CmdLow => {
				self.command |= nibble();
				State::LenHigh
			}
			State::LenHigh => {
				self.len = nibble() << 4;
				State::LenLow
			}
			State::LenLow => {
				self.len |= nibble();
				self.count = 0;
				if self.len != 0 { State::PayloadHigh } else { State::ChkHigh }
			}
			State::PayloadHigh => {
				self.payload[self.count as usize] = nibble() << 4;
				State::PayloadLow
			}
			State::PayloadLow => {
				self.payload[self.count as usize] |= nibble();
				self.count += 1;
				assert!(self.count <= self.len, "payload counter past declared length");
				if self.count < self.len { State::PayloadHigh } else { State::ChkHigh }
			}
			State::ChkHigh => {
				self.checksum = nibble() << 4;
				State::ChkLow
			}
			State::ChkLow => {
				self.checksum |= nibble();
				State::EndFlag
			}
			State::EndFlag => {
				self.state = State::Idle;
				self.trace(from, State::Idle);
				return Step::Complete(self.frame(byte));
			}
		};

		self.state = next;
		self.trace(from, next);

		if bad_digit {
			let err = FrameError::InvalidHexDigit(byte);
			self.error.get_or_insert(err);
			Step::Malformed { byte, state: next }
		} else {
			Step::Advanced(next)
		}
	}

	fn frame(&self, trailer: u8) -> Frame {
		Frame {
			command: self.command,
			len: self.len,
			payload: self.payload,
			checksum: self.checksum,
			trailer,
			error: self.error,
		}
	}

	#[cfg(feature = "trace")]
	fn trace(&self, from: State, to: State) {
		log_debug!(LOG_ORIGIN, "{} -> {} (count {}/{})", from, to, self.count, self.len);
	}

	#[cfg(not(feature = "trace"))]
	#[inline(always)]
	fn trace(&self, _from: State, _to: State) {}
}
