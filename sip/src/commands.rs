use hal::log_debug;

const LOG_ORIGIN: &str = "sip";

pub const COMMAND_COUNT: usize = 256;

/*
 * trait CommandHandler - Runs one command
 *
 * Gets the frame's payload and returns a status code, zero for success.
 */
pub trait CommandHandler: Sync {
	fn call(&self, payload: &[u8]) -> i32;
}

impl<F> CommandHandler for F
where
	F: Fn(&[u8]) -> i32 + Sync,
{
	fn call(&self, payload: &[u8]) -> i32 {
		self(payload)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	Handled { command: u8, status: i32 },
	/* No handler registered; the frame is dropped */
	Unrouted { command: u8 },
}

impl Dispatch {
	pub fn command(&self) -> u8 {
		match *self {
			Dispatch::Handled { command, .. } | Dispatch::Unrouted { command } => command,
		}
	}

	pub fn status(&self) -> Option<i32> {
		match *self {
			Dispatch::Handled { status, .. } => Some(status),
			Dispatch::Unrouted { .. } => None,
		}
	}
}

/* Call @handler if there is one */
pub(crate) fn invoke(command: u8, handler: Option<&dyn CommandHandler>, payload: &[u8]) -> Dispatch {
	match handler {
		Some(handler) => Dispatch::Handled {
			command,
			status: handler.call(payload),
		},
		None => Dispatch::Unrouted { command },
	}
}

/* One slot per command identifier */
pub struct CommandTable {
	slots: [Option<&'static dyn CommandHandler>; COMMAND_COUNT],
}

impl Default for CommandTable {
	fn default() -> Self {
		Self::new()
	}
}

impl CommandTable {
	pub const fn new() -> Self {
		CommandTable {
			slots: [None; COMMAND_COUNT],
		}
	}

	//Overwrites whatever was registered before
	pub fn register(&mut self, command: u8, handler: &'static dyn CommandHandler) {
		self.slots[command as usize] = Some(handler);
		log_debug!(LOG_ORIGIN, "command {:#04x} registered", command);
	}

	//Clearing an empty slot is fine
	pub fn deregister(&mut self, command: u8) {
		self.slots[command as usize] = None;
	}

	pub fn get(&self, command: u8) -> Option<&'static dyn CommandHandler> {
		self.slots[command as usize]
	}

	pub fn is_registered(&self, command: u8) -> bool {
		self.slots[command as usize].is_some()
	}

	pub fn dispatch(&self, command: u8, payload: &[u8]) -> Dispatch {
		invoke(command, self.get(command), payload)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	fn leak<H: CommandHandler + 'static>(handler: H) -> &'static dyn CommandHandler {
		Box::leak(Box::new(handler))
	}

	#[test]
	fn unrouted_command() {
		let table = CommandTable::new();
		assert_eq!(table.dispatch(0x42, &[1, 2]), Dispatch::Unrouted { command: 0x42 });
		assert!(!table.is_registered(0x42));
	}

	#[test]
	fn handler_sees_payload_and_returns_status() {
		let mut table = CommandTable::new();
		table.register(0x10, leak(|p: &[u8]| p.iter().map(|&b| b as i32).sum::<i32>()));
		let outcome = table.dispatch(0x10, &[1, 2, 3]);
		assert_eq!(outcome, Dispatch::Handled { command: 0x10, status: 6 });
		assert_eq!(outcome.status(), Some(6));
		assert_eq!(outcome.command(), 0x10);
	}

	#[test]
	fn reregistration_replaces_handler() {
		static FIRST: AtomicU32 = AtomicU32::new(0);
		static SECOND: AtomicU32 = AtomicU32::new(0);

		let mut table = CommandTable::new();
		table.register(0x01, leak(|_: &[u8]| {
			FIRST.fetch_add(1, Ordering::SeqCst);
			0
		}));
		table.register(0x01, leak(|_: &[u8]| {
			SECOND.fetch_add(1, Ordering::SeqCst);
			0
		}));
		table.dispatch(0x01, &[]);
		table.dispatch(0x01, &[]);

		assert_eq!(FIRST.load(Ordering::SeqCst), 0);
		assert_eq!(SECOND.load(Ordering::SeqCst), 2);
		assert!(table.is_registered(0x01));
	}

	#[test]
	fn deregistering_empty_slot_is_a_no_op() {
		let mut table = CommandTable::new();
		table.register(0x02, leak(|_: &[u8]| 0));
		table.deregister(0x05);
		table.deregister(0x05);
		assert!(!table.is_registered(0x05));
		assert!(table.is_registered(0x02));

		table.deregister(0x02);
		assert_eq!(table.dispatch(0x02, &[]), Dispatch::Unrouted { command: 0x02 });
	}
}
