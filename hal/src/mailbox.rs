/*
 * VideoCore Mailbox Property Interface
 *
 * Builds property-tag request buffers, posts them to the GPU on the
 * property channel and reads tag responses back out of the same buffer.
 * Only used during bring-up (board identity, clock rates).
 */

use core::fmt;
use core::sync::atomic::{fence, Ordering};

use crate::board;
use crate::io::Mmio;

/* Mailbox 0 register offsets (mailbox 1 write sits at +0x20) */
const MBOX_READ: usize = 0x00;
const MBOX_STATUS: usize = 0x18;
const MBOX_WRITE: usize = 0x20;

const MBOX_FULL: u32 = 0x8000_0000;
const MBOX_EMPTY: u32 = 0x4000_0000;

pub const CHANNEL_PROPERTY_ARM_TO_VC: u8 = 8;

const CODE_REQUEST: u32 = 0x0000_0000;
const CODE_RESPONSE_SUCCESS: u32 = 0x8000_0000;
const TAG_RESPONSE: u32 = 0x8000_0000;
const TAG_END: u32 = 0;

pub const PROPERTY_BUFFER_WORDS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
	/* Tag does not fit in the remaining buffer space */
	BufferFull,
	/* GPU answered with something other than "request successful" */
	Rejected(u32),
	/* Buffer address is not 16-byte aligned */
	Misaligned,
}

impl fmt::Display for MailboxError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MailboxError::BufferFull => write!(f, "property buffer full"),
			MailboxError::Rejected(code) => write!(f, "property request rejected ({:#010x})", code),
			MailboxError::Misaligned => write!(f, "property buffer not 16-byte aligned"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Tag {
	GetFirmwareVersion = 0x0000_0001,
	GetBoardModel = 0x0001_0001,
	GetBoardRevision = 0x0001_0002,
	GetBoardMacAddress = 0x0001_0003,
	GetBoardSerial = 0x0001_0004,
	GetArmMemory = 0x0001_0005,
	GetClockRate = 0x0003_0002,
	GetMaxClockRate = 0x0003_0004,
	SetClockRate = 0x0003_8002,
}

impl Tag {
	/* Value buffer size in bytes: the larger of request and response */
	pub const fn value_size(&self) -> u32 {
		match self {
			Tag::GetFirmwareVersion | Tag::GetBoardModel | Tag::GetBoardRevision => 4,
			Tag::GetBoardMacAddress => 6,
			Tag::GetBoardSerial | Tag::GetArmMemory => 8,
			Tag::GetClockRate | Tag::GetMaxClockRate => 8,
			Tag::SetClockRate => 12,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Clock {
	Emmc = 1,
	Uart = 2,
	Arm = 3,
	Core = 4,
}

/*
 * struct PropertyValue - Value area of one tag in a processed buffer
 */
#[derive(Debug, Clone, Copy)]
pub struct PropertyValue<'a> {
	words: &'a [u32],
	len: usize,
}

impl<'a> PropertyValue<'a> {
	pub fn word(&self, index: usize) -> Option<u32> {
		self.words.get(index).copied()
	}

	/* Byte @index of the value area, little-endian within each word */
	pub fn byte(&self, index: usize) -> Option<u8> {
		if index >= self.len {
			return None;
		}
		self.word(index / 4).map(|w| (w >> ((index % 4) * 8)) as u8)
	}

	/* Response length in bytes as reported by the GPU */
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/*
 * struct PropertyBuffer - One property request/response message
 *
 * Layout: [total size, code, tags..., end tag]. Each tag is
 * [id, value size, request/response code, value words...].
 */
#[repr(C, align(16))]
pub struct PropertyBuffer {
	words: [u32; PROPERTY_BUFFER_WORDS],
	index: usize,
}

impl Default for PropertyBuffer {
	fn default() -> Self {
		Self::new()
	}
}

impl PropertyBuffer {
	pub const fn new() -> Self {
		PropertyBuffer {
			words: [0; PROPERTY_BUFFER_WORDS],
			index: 2,
		}
	}

	/*
	 * clear - Start a fresh request in this buffer
	 */
	pub fn clear(&mut self) {
		self.words = [0; PROPERTY_BUFFER_WORDS];
		self.index = 2;
	}

	/*
	 * add_tag - Append a tag with its request arguments
	 * @tag: Tag to request
	 * @args: Request words; the rest of the value area is zeroed
	 */
	pub fn add_tag(&mut self, tag: Tag, args: &[u32]) -> Result<(), MailboxError> {
		let value_words = tag.value_size().div_ceil(4) as usize;
		/* header + value + room for the end tag */
		if self.index + 3 + value_words + 1 > PROPERTY_BUFFER_WORDS || args.len() > value_words {
			return Err(MailboxError::BufferFull);
		}
		self.words[self.index] = tag as u32;
		self.words[self.index + 1] = tag.value_size();
		self.words[self.index + 2] = CODE_REQUEST;
		let value = &mut self.words[self.index + 3..self.index + 3 + value_words];
		value.fill(0);
		value[..args.len()].copy_from_slice(args);
		self.index += 3 + value_words;
		Ok(())
	}

	/*
	 * finish - Terminate the tag list and fill in the message header
	 */
	pub fn finish(&mut self) {
		self.words[self.index] = TAG_END;
		self.words[0] = ((self.index + 1) * 4) as u32;
		self.words[1] = CODE_REQUEST;
	}

	pub fn code(&self) -> u32 {
		self.words[1]
	}

	pub fn words(&self) -> &[u32] {
		&self.words[..self.index + 1]
	}

	/*
	 * get - Find a tag's response value
	 *
	 * Returns None if the tag was not requested or the GPU did not mark it
	 * as answered.
	 */
	pub fn get(&self, tag: Tag) -> Option<PropertyValue<'_>> {
		let mut i = 2;
		while i + 2 < PROPERTY_BUFFER_WORDS {
			let id = self.words[i];
			if id == TAG_END {
				return None;
			}
			let value_words = self.words[i + 1].div_ceil(4) as usize;
			let code = self.words[i + 2];
			let start = i + 3;
			let end = (start + value_words).min(PROPERTY_BUFFER_WORDS);
			if id == tag as u32 {
				if code & TAG_RESPONSE == 0 {
					return None;
				}
				return Some(PropertyValue {
					words: &self.words[start..end],
					len: (code & !TAG_RESPONSE) as usize,
				});
			}
			i = end;
		}
		None
	}

	fn as_mut_ptr(&mut self) -> *mut u32 {
		self.words.as_mut_ptr()
	}
}

pub struct Mailbox {
	regs: Mmio,
}

impl Mailbox {
	pub const unsafe fn new(base: usize) -> Self {
		Mailbox {
			regs: unsafe { Mmio::new(base) },
		}
	}

	pub const fn board() -> Self {
		unsafe { Mailbox::new(board::MAILBOX_BASE) }
	}

	/*
	 * write - Post a 28-bit message on @channel
	 */
	pub fn write(&self, channel: u8, data: u32) {
		while self.regs.read(MBOX_STATUS) & MBOX_FULL != 0 {
			core::hint::spin_loop();
		}
		self.regs.write(MBOX_WRITE, (data & !0xF) | (channel as u32 & 0xF));
	}

	/*
	 * read - Wait for a message on @channel, discarding other channels
	 */
	pub fn read(&self, channel: u8) -> u32 {
		loop {
			while self.regs.read(MBOX_STATUS) & MBOX_EMPTY != 0 {
				core::hint::spin_loop();
			}
			let value = self.regs.read(MBOX_READ);
			if value & 0xF == channel as u32 & 0xF {
				return value & !0xF;
			}
		}
	}

	/*
	 * call - Process a finished property buffer synchronously
	 */
	pub fn call(&self, buffer: &mut PropertyBuffer) -> Result<(), MailboxError> {
		let addr = buffer.as_mut_ptr() as usize;
		if addr & 0xF != 0 {
			return Err(MailboxError::Misaligned);
		}
		let bus_addr = (addr as u32) | board::VC_BUS_ALIAS;

		fence(Ordering::SeqCst);
		self.write(CHANNEL_PROPERTY_ARM_TO_VC, bus_addr);
		self.read(CHANNEL_PROPERTY_ARM_TO_VC);
		fence(Ordering::SeqCst);

		match buffer.code() {
			CODE_RESPONSE_SUCCESS => Ok(()),
			code => Err(MailboxError::Rejected(code)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::{read32, write32};

	#[test]
	fn request_layout() {
		let mut buf = PropertyBuffer::new();
		buf.add_tag(Tag::GetBoardModel, &[]).unwrap();
		buf.add_tag(Tag::GetMaxClockRate, &[Clock::Arm as u32]).unwrap();
		buf.finish();

		assert_eq!(
			buf.words(),
			&[48, 0, 0x0001_0001, 4, 0, 0, 0x0003_0004, 8, 0, 3, 0, 0]
		);
		assert_eq!(buf.get(Tag::GetBoardModel).map(|v| v.len()), None);
	}

	#[test]
	fn response_lookup() {
		let mut buf = PropertyBuffer::new();
		buf.add_tag(Tag::GetBoardRevision, &[]).unwrap();
		buf.add_tag(Tag::GetBoardMacAddress, &[]).unwrap();
		buf.finish();

		// Fake what the GPU writes back.
		buf.words[1] = CODE_RESPONSE_SUCCESS;
		buf.words[4] = TAG_RESPONSE | 4;
		buf.words[5] = 0x00a2_1041;
		buf.words[8] = TAG_RESPONSE | 6;
		buf.words[9] = 0xB822_1100;
		buf.words[10] = 0x0000_5544;

		assert_eq!(buf.get(Tag::GetBoardRevision).and_then(|v| v.word(0)), Some(0x00a2_1041));

		let mac = buf.get(Tag::GetBoardMacAddress).unwrap();
		assert_eq!(mac.len(), 6);
		assert_eq!(mac.byte(0), Some(0x00));
		assert_eq!(mac.byte(3), Some(0xB8));
		assert_eq!(mac.byte(5), Some(0x55));
		assert_eq!(mac.byte(6), None);

		assert!(buf.get(Tag::GetBoardSerial).is_none());
	}

	#[test]
	fn full_buffer_is_reported() {
		let mut buf = PropertyBuffer::new();
		let mut added = 0;
		while buf.add_tag(Tag::SetClockRate, &[3, 700_000_000, 0]).is_ok() {
			added += 1;
		}
		assert_eq!(added, (PROPERTY_BUFFER_WORDS - 3) / 6);
		assert_eq!(
			buf.add_tag(Tag::GetBoardModel, &[1, 2]),
			Err(MailboxError::BufferFull)
		);
	}

	#[test]
	fn mailbox_filters_by_channel() {
		let mut regs = [0u32; 0x24 / 4];
		let base = regs.as_mut_ptr() as usize;
		let mbox = unsafe { Mailbox::new(base) };

		mbox.write(CHANNEL_PROPERTY_ARM_TO_VC, 0x1234_5670);
		assert_eq!(unsafe { read32(base + MBOX_WRITE) }, 0x1234_5678);

		unsafe { write32(base + MBOX_READ, 0xABCD_EF08) };
		assert_eq!(mbox.read(CHANNEL_PROPERTY_ARM_TO_VC), 0xABCD_EF00);
	}
}
