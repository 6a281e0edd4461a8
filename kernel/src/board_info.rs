/*
 * Board identity over the property mailbox, printed once at boot
 */

use hal::mailbox::{Clock, Mailbox, MailboxError, PropertyBuffer, Tag};
use hal::{log_info, log_warn, serial_println};

const LOG_ORIGIN: &str = "board";

const HZ_PER_MHZ: u32 = 1_000_000;

pub fn report() {
	let mailbox = Mailbox::board();
	let mut buf = PropertyBuffer::new();

	if let Err(err) = query_identity(&mailbox, &mut buf) {
		log_warn!(LOG_ORIGIN, "identity query failed: {}", err);
	}
	print_identity(&buf);

	let Some(max_hz) = buf.get(Tag::GetMaxClockRate).and_then(|v| v.word(1)) else {
		log_warn!(LOG_ORIGIN, "no maximum ARM clock reported, leaving clock alone");
		return;
	};
	match raise_arm_clock(&mailbox, &mut buf, max_hz) {
		Ok(hz) => log_info!(LOG_ORIGIN, "ARM clock set to {} MHz", hz / HZ_PER_MHZ),
		Err(err) => log_warn!(LOG_ORIGIN, "could not set ARM clock: {}", err),
	}
}

fn query_identity(mailbox: &Mailbox, buf: &mut PropertyBuffer) -> Result<(), MailboxError> {
	buf.clear();
	buf.add_tag(Tag::GetBoardModel, &[])?;
	buf.add_tag(Tag::GetBoardRevision, &[])?;
	buf.add_tag(Tag::GetFirmwareVersion, &[])?;
	buf.add_tag(Tag::GetBoardMacAddress, &[])?;
	buf.add_tag(Tag::GetBoardSerial, &[])?;
	buf.add_tag(Tag::GetMaxClockRate, &[Clock::Arm as u32])?;
	buf.finish();
	mailbox.call(buf)
}

fn print_identity(buf: &PropertyBuffer) {
	let word = |tag| buf.get(tag).and_then(|v| v.word(0));

	match word(Tag::GetBoardModel) {
		Some(model) => serial_println!("Board Model: {:#x}", model),
		None => serial_println!("Board Model: unknown"),
	}
	match word(Tag::GetBoardRevision) {
		Some(rev) => serial_println!("Board Revision: {:#x}", rev),
		None => serial_println!("Board Revision: unknown"),
	}
	match word(Tag::GetFirmwareVersion) {
		Some(fw) => serial_println!("Firmware Version: {:#x}", fw),
		None => serial_println!("Firmware Version: unknown"),
	}

	match buf.get(Tag::GetBoardMacAddress) {
		Some(mac) if mac.len() >= 6 => {
			let b = |i| mac.byte(i).unwrap_or(0);
			serial_println!(
				"MAC Address: {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
				b(0),
				b(1),
				b(2),
				b(3),
				b(4),
				b(5)
			);
		}
		_ => serial_println!("MAC Address: unknown"),
	}

	match buf.get(Tag::GetBoardSerial) {
		Some(serial) => serial_println!(
			"Serial Number: {:08X}{:08X}",
			serial.word(0).unwrap_or(0),
			serial.word(1).unwrap_or(0)
		),
		None => serial_println!("Serial Number: unknown"),
	}

	if let Some(hz) = buf.get(Tag::GetMaxClockRate).and_then(|v| v.word(1)) {
		serial_println!("Maximum ARM Clock Rate: {} MHz", hz / HZ_PER_MHZ);
	}
}

/*
 * raise_arm_clock - Run the ARM core at @max_hz
 *
 * Returns the rate the firmware reports afterwards.
 */
fn raise_arm_clock(mailbox: &Mailbox, buf: &mut PropertyBuffer, max_hz: u32) -> Result<u32, MailboxError> {
	buf.clear();
	buf.add_tag(Tag::SetClockRate, &[Clock::Arm as u32, max_hz])?;
	buf.finish();
	mailbox.call(buf)?;

	buf.clear();
	buf.add_tag(Tag::GetClockRate, &[Clock::Arm as u32])?;
	buf.finish();
	mailbox.call(buf)?;

	buf.get(Tag::GetClockRate)
		.and_then(|v| v.word(1))
		.ok_or(MailboxError::Rejected(buf.code()))
}
