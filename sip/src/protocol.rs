use hal::serial::ByteSource;
use hal::sync::IrqMutex;
use hal::log_warn;

use crate::commands::{CommandHandler, CommandTable, Dispatch, invoke};
use crate::decoder::{Decoder, State, Step};

const LOG_ORIGIN: &str = "sip";

/*
 * struct Protocol - Decoder plus command table, shareable between contexts
 *
 * Both halves sit behind IrqMutex, so the UART interrupt handler and the
 * main loop may feed bytes without stepping on each other. Handlers run
 * with neither lock held.
 */
pub struct Protocol {
	decoder: IrqMutex<Decoder>,
	commands: IrqMutex<CommandTable>,
}

impl Default for Protocol {
	fn default() -> Self {
		Self::new()
	}
}

impl Protocol {
	pub const fn new() -> Self {
		Protocol {
			decoder: IrqMutex::new(Decoder::new()),
			commands: IrqMutex::new(CommandTable::new()),
		}
	}

	pub fn register(&self, command: u8, handler: &'static dyn CommandHandler) {
		self.commands.lock().register(command, handler);
	}

	pub fn deregister(&self, command: u8) {
		self.commands.lock().deregister(command);
	}

	pub fn is_registered(&self, command: u8) -> bool {
		self.commands.lock().is_registered(command)
	}

	pub fn state(&self) -> State {
		self.decoder.lock().state()
	}

	/*
	 * feed - Push one received byte through the decoder
	 *
	 * Returns Some once a frame completes, whether or not a handler was
	 * registered for it. Non-zero handler statuses are logged.
	 */
	pub fn feed(&self, byte: u8) -> Option<Dispatch> {
		let step = self.decoder.lock().feed(byte);
		let Step::Complete(frame) = step else {
			return None;
		};

		let handler = self.commands.lock().get(frame.command());
		let outcome = invoke(frame.command(), handler, frame.payload());
		if let Dispatch::Handled { command, status } = outcome {
			if status != 0 {
				log_warn!(LOG_ORIGIN, "command {:#04x} returned {}", command, status);
			}
		}
		Some(outcome)
	}

	/* Feed everything @source has buffered; returns completed frames */
	pub fn drain(&self, source: &mut impl ByteSource) -> usize {
		let mut frames = 0;
		while let Some(byte) = source.try_read() {
			if self.feed(byte).is_some() {
				frames += 1;
			}
		}
		frames
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;
	use hal::cpu;
	use std::sync::{Arc, Mutex, MutexGuard};

	// Every test here goes through IrqMutex and so through the emulated CPSR
	// shared by the whole binary; run them one at a time.
	static CPU: Mutex<()> = Mutex::new(());

	fn cpu_lock() -> MutexGuard<'static, ()> {
		CPU.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	type Payloads = Arc<Mutex<Vec<Vec<u8>>>>;

	fn recorder(status: i32) -> (&'static dyn CommandHandler, Payloads) {
		let seen: Payloads = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let handler = move |payload: &[u8]| {
			sink.lock().unwrap().push(payload.to_vec());
			status
		};
		(Box::leak(Box::new(handler)), seen)
	}

	fn feed_str(protocol: &Protocol, wire: &str) -> Vec<Dispatch> {
		wire.bytes().filter_map(|b| protocol.feed(b)).collect()
	}

	struct Fifo(VecDeque<u8>);

	impl ByteSource for Fifo {
		fn read_blocking(&mut self) -> u8 {
			self.0.pop_front().unwrap()
		}

		fn try_read(&mut self) -> Option<u8> {
			self.0.pop_front()
		}
	}

	#[test]
	fn end_to_end_with_arbitrary_trailer() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, seen) = recorder(0);
		protocol.register(0x01, handler);

		let outcomes = feed_str(&protocol, "<0102ABCD78X");

		assert_eq!(outcomes, vec![Dispatch::Handled { command: 0x01, status: 0 }]);
		assert_eq!(*seen.lock().unwrap(), vec![vec![0xAB, 0xCD]]);
		assert_eq!(protocol.state(), State::Idle);
	}

	#[test]
	fn partial_frame_before_resync_is_not_processed() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, seen) = recorder(0);
		protocol.register(0x01, handler);
		protocol.register(0xFF, handler);

		let outcomes = feed_str(&protocol, "<FF<0102ABCD78>");

		assert_eq!(outcomes.len(), 1);
		assert_eq!(*seen.lock().unwrap(), vec![vec![0xAB, 0xCD]]);
	}

	#[test]
	fn zero_length_frame_dispatches_empty_payload() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, seen) = recorder(0);
		protocol.register(0x00, handler);

		feed_str(&protocol, "<00000078>");

		assert_eq!(*seen.lock().unwrap(), vec![Vec::<u8>::new()]);
	}

	#[test]
	fn only_latest_registration_runs() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (h1, seen1) = recorder(0);
		let (h2, seen2) = recorder(0);
		protocol.register(0x01, h1);
		protocol.register(0x01, h2);

		feed_str(&protocol, "<0101AA00><0101BB00>");

		assert!(seen1.lock().unwrap().is_empty());
		assert_eq!(seen2.lock().unwrap().len(), 2);
	}

	#[test]
	fn unrouted_and_failing_commands_are_reported() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, _) = recorder(-3);
		protocol.register(0x04, handler);

		let outcomes = feed_str(&protocol, "<090000><040000>");

		assert_eq!(
			outcomes,
			vec![
				Dispatch::Unrouted { command: 0x09 },
				Dispatch::Handled { command: 0x04, status: -3 },
			]
		);
		protocol.deregister(0x04);
		assert!(!protocol.is_registered(0x04));
	}

	#[test]
	fn drain_consumes_a_byte_source() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, seen) = recorder(0);
		protocol.register(0x01, handler);
		let mut fifo = Fifo(b"<0101AA00><0102".iter().copied().collect());

		assert_eq!(protocol.drain(&mut fifo), 1);
		assert!(fifo.0.is_empty());
		assert_eq!(protocol.state(), State::PayloadHigh);

		fifo.0.extend(b"BBCC00>".iter().copied());
		assert_eq!(protocol.drain(&mut fifo), 1);
		assert_eq!(*seen.lock().unwrap(), vec![vec![0xAA], vec![0xBB, 0xCC]]);
	}

	#[test]
	fn handler_may_register_commands() {
		let _cpu = cpu_lock();
		static PROTOCOL: Protocol = Protocol::new();
		fn second(_: &[u8]) -> i32 {
			7
		}
		static SECOND: fn(&[u8]) -> i32 = second;
		fn install(_: &[u8]) -> i32 {
			PROTOCOL.register(0x02, &SECOND);
			0
		}
		static INSTALL: fn(&[u8]) -> i32 = install;

		PROTOCOL.register(0x01, &INSTALL);
		let outcomes: Vec<Dispatch> = b"<010000><020000>".iter().filter_map(|&b| PROTOCOL.feed(b)).collect();
		assert_eq!(outcomes[1], Dispatch::Handled { command: 0x02, status: 7 });
	}

	#[test]
	fn register_and_feed_leave_irq_state_as_found() {
		let _cpu = cpu_lock();
		let protocol = Protocol::new();
		let (handler, seen) = recorder(0);

		cpu::enable_interrupts();
		protocol.register(0x01, handler);
		assert!(cpu::interrupts_enabled());
		feed_str(&protocol, "<0101AA00>");
		assert!(cpu::interrupts_enabled());
		protocol.deregister(0x01);
		assert!(cpu::interrupts_enabled());
		assert_eq!(seen.lock().unwrap().len(), 1);

		cpu::disable_interrupts();
		protocol.register(0x01, handler);
		assert!(!cpu::interrupts_enabled());
	}
}
