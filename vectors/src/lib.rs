/*
 * Interrupt Vector Table and IRQ Dispatcher
 *
 * The table maps each of the 72 interrupt identifiers to at most one
 * (handler, context) pair. The dispatcher is what the IRQ exception vector
 * calls: it walks the tiered pending registers and invokes the registered
 * handler for every pending source.
 *
 * The table lives behind an IrqMutex, so registration from ordinary code
 * runs with IRQs masked and the dispatcher never sees a half-written entry.
 */

#![cfg_attr(not(test), no_std)]

use core::fmt;

use hal::sync::IrqMutex;
use hal::log_debug;
use intc::{BASIC_LOCAL_MASK, BASIC_PENDING_1, BASIC_PENDING_2, IRQ_COUNT, Irq, IrqController, IrqError, Tier};

pub mod traps;

const LOG_ORIGIN: &str = "vectors";

/*
 * trait IrqHandler - Services one interrupt source
 *
 * @context is the opaque value supplied at registration.
 */
pub trait IrqHandler: Sync {
	fn handle(&self, irq: Irq, context: usize);
}

impl<F> IrqHandler for F
where
	F: Fn(Irq, usize) + Sync,
{
	fn handle(&self, irq: Irq, context: usize) {
		self(irq, context)
	}
}

#[derive(Clone, Copy)]
pub struct Vector {
	handler: &'static dyn IrqHandler,
	context: usize,
}

impl Vector {
	pub fn context(&self) -> usize {
		self.context
	}

	pub fn invoke(&self, irq: Irq) {
		self.handler.handle(irq, self.context);
	}
}

impl fmt::Debug for Vector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Vector").field("context", &self.context).finish_non_exhaustive()
	}
}

#[derive(Clone, Copy, Debug)]
struct Slot {
	vector: Option<Vector>,
	hits: u32,
}

impl Slot {
	const EMPTY: Slot = Slot {
		vector: None,
		hits: 0,
	};
}

/* One slot per interrupt identifier */
pub struct VectorTable {
	slots: [Slot; IRQ_COUNT],
	unhandled: u32,
}

impl VectorTable {
	pub const fn new() -> Self {
		VectorTable {
			slots: [Slot::EMPTY; IRQ_COUNT],
			unhandled: 0,
		}
	}

	pub fn set(&mut self, irq: Irq, vector: Option<Vector>) -> Option<Vector> {
		let slot = &mut self.slots[irq.index()];
		core::mem::replace(&mut slot.vector, vector)
	}

	pub fn get(&self, irq: Irq) -> Option<Vector> {
		self.slots[irq.index()].vector
	}

	//Lookup plus hit/unhandled accounting
	fn take_for_dispatch(&mut self, irq: Irq) -> Option<Vector> {
		let slot = &mut self.slots[irq.index()];
		match slot.vector {
			Some(vector) => {
				slot.hits = slot.hits.wrapping_add(1);
				Some(vector)
			}
			None => {
				self.unhandled = self.unhandled.wrapping_add(1);
				None
			}
		}
	}
}

impl Default for VectorTable {
	fn default() -> Self {
		Self::new()
	}
}

/* Index of the most significant set bit; None for an empty mask */
#[inline]
pub const fn highest_set_bit(mask: u32) -> Option<u32> {
	if mask == 0 {
		None
	} else {
		Some(31 - mask.leading_zeros())
	}
}

pub struct Vectors {
	table: IrqMutex<VectorTable>,
}

impl Default for Vectors {
	fn default() -> Self {
		Self::new()
	}
}

impl Vectors {
	pub const fn new() -> Self {
		Vectors {
			table: IrqMutex::new(VectorTable::new()),
		}
	}

	/*
	 * register - Install @handler for @irq
	 * @context: Passed back to @handler on every invocation
	 *
	 * Replaces any previous handler without complaint. The write happens
	 * with IRQs masked so the dispatcher never sees a torn entry.
	 */
	pub fn register(&self, irq: Irq, handler: &'static dyn IrqHandler, context: usize) {
		let previous = self.table.lock().set(irq, Some(Vector { handler, context }));
		if previous.is_some() {
			log_debug!(LOG_ORIGIN, "{} handler replaced", irq);
		} else {
			log_debug!(LOG_ORIGIN, "{} handler registered", irq);
		}
	}

	//Raw identifiers are validated first; >= 72 is rejected
	pub fn register_number(
		&self,
		number: u32,
		handler: &'static dyn IrqHandler,
		context: usize,
	) -> Result<(), IrqError> {
		let irq = Irq::new(number)?;
		self.register(irq, handler, context);
		Ok(())
	}

	pub fn unregister(&self, irq: Irq) {
		if self.table.lock().set(irq, None).is_some() {
			log_debug!(LOG_ORIGIN, "{} handler removed", irq);
		}
	}

	pub fn is_registered(&self, irq: Irq) -> bool {
		self.table.lock().get(irq).is_some()
	}

	pub fn context(&self, irq: Irq) -> Option<usize> {
		self.table.lock().get(irq).map(|v| v.context())
	}

	pub fn hits(&self, irq: Irq) -> u32 {
		self.table.lock().slots[irq.index()].hits
	}

	//Pending sources seen with no handler registered
	pub fn unhandled(&self) -> u32 {
		self.table.lock().unhandled
	}

	/*
	 * dispatch - Service everything pending on @intc
	 *
	 * Basic pending is read once. Tier A is serviced when its summary bit is
	 * set, then tier B, then the ARM-local field of the basic register.
	 * Returns how many handlers ran.
	 */
	pub fn dispatch(&self, intc: &impl IrqController) -> usize {
		let basic = intc.basic_pending();
		let mut serviced = 0;

		if basic & BASIC_PENDING_1 != 0 {
			serviced += self.service_tier(Tier::A, intc.pending(Tier::A));
		}
		if basic & BASIC_PENDING_2 != 0 {
			serviced += self.service_tier(Tier::B, intc.pending(Tier::B));
		}
		if basic & BASIC_LOCAL_MASK != 0 {
			serviced += self.service_tier(Tier::Basic, basic & BASIC_LOCAL_MASK);
		}
		serviced
	}

	/*
	 * service_tier - Run handlers for each bit of @pending, highest bit first
	 *
	 * Bits are cleared from the local copy as they are visited, so at most 32
	 * iterations. Unhandled bits are skipped. The table lock is dropped before
	 * the handler runs; handlers may touch the table.
	 */
	pub fn service_tier(&self, tier: Tier, mut pending: u32) -> usize {
		let mut serviced = 0;
		while let Some(bit) = highest_set_bit(pending) {
			pending &= !(1 << bit);

			let Ok(irq) = Irq::from_tier_bit(tier, bit) else {
				continue;
			};
			let vector = self.table.lock().take_for_dispatch(irq);
			if let Some(vector) = vector {
				vector.invoke(irq);
				serviced += 1;
			}
		}
		serviced
	}
}
