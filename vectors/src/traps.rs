use core::cell::UnsafeCell;
use core::fmt;

use hal::cpu;
use hal::gpio::OutputPin;
use hal::log_error;
use intc::{Irq, IrqController};
use util::panic::halt_with;

const LOG_ORIGIN: &str = "traps";

/* Exceptions with no recovery path on this firmware */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
	Reset,
	UndefinedInstruction,
	SupervisorCall,
	PrefetchAbort,
	DataAbort,
	Unused,
}

impl Trap {
	pub const fn name(&self) -> &'static str {
		match self {
			Trap::Reset => "reset",
			Trap::UndefinedInstruction => "undefined instruction",
			Trap::SupervisorCall => "supervisor call",
			Trap::PrefetchAbort => "prefetch abort",
			Trap::DataAbort => "data abort",
			Trap::Unused => "unused vector",
		}
	}

	/* Offset of the entry in the exception vector table */
	pub const fn vector_offset(&self) -> u32 {
		match self {
			Trap::Reset => 0x00,
			Trap::UndefinedInstruction => 0x04,
			Trap::SupervisorCall => 0x08,
			Trap::PrefetchAbort => 0x0C,
			Trap::DataAbort => 0x10,
			Trap::Unused => 0x14,
		}
	}

	pub const fn from_vector_offset(offset: u32) -> Option<Trap> {
		match offset {
			0x00 => Some(Trap::Reset),
			0x04 => Some(Trap::UndefinedInstruction),
			0x08 => Some(Trap::SupervisorCall),
			0x0C => Some(Trap::PrefetchAbort),
			0x10 => Some(Trap::DataAbort),
			0x14 => Some(Trap::Unused),
			_ => None,
		}
	}
}

impl fmt::Display for Trap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/*
 * fatal - Terminal path for every non-IRQ exception
 * @trap: Which vector fired
 * @indicator: Output left blinking while halted
 *
 * Masks IRQ and FIQ and never returns.
 */
pub fn fatal(trap: Trap, indicator: &mut impl OutputPin) -> ! {
	log_error!(LOG_ORIGIN, "{} trap (vector {:#04x}), halting", trap, trap.vector_offset());
	halt_with(indicator)
}

pub type FiqRoutine = fn();

/*
 * struct FastIrq - The single fast-interrupt slot
 *
 * Only one source can be routed to FIQ at a time. Writers hold off both IRQ
 * and FIQ while they touch the slot; the reader runs in FIQ mode, where the
 * core has FIQ masked already.
 *
 * IrqMutex only masks IRQ, so a FIQ routine must never take one (console
 * output and logging included): it could spin forever on a lock held by
 * the code it interrupted.
 */
pub struct FastIrq {
	slot: UnsafeCell<Option<(Irq, FiqRoutine)>>,
}

unsafe impl Sync for FastIrq {}

impl Default for FastIrq {
	fn default() -> Self {
		Self::new()
	}
}

impl FastIrq {
	pub const fn new() -> Self {
		FastIrq {
			slot: UnsafeCell::new(None),
		}
	}

	/*
	 * install - Route @irq to FIQ and run @routine for it
	 *
	 * The source's IRQ enable is cleared first so it is only ever taken on
	 * the FIQ path. Returns the source that was routed before, if any.
	 */
	pub fn install(&self, irq: Irq, routine: FiqRoutine, intc: &impl IrqController) -> Option<Irq> {
		let saved = cpu::mask_all();
		//Both exception classes are masked, nothing else can see the slot
		let previous = unsafe { (*self.slot.get()).replace((irq, routine)) };
		intc.disable(irq);
		intc.route_fiq(Some(irq));
		cpu::restore(saved);
		previous.map(|(irq, _)| irq)
	}

	pub fn remove(&self, intc: &impl IrqController) -> Option<Irq> {
		let saved = cpu::mask_all();
		intc.route_fiq(None);
		let previous = unsafe { (*self.slot.get()).take() };
		cpu::restore(saved);
		previous.map(|(irq, _)| irq)
	}

	pub fn source(&self) -> Option<Irq> {
		let saved = cpu::mask_all();
		let current = unsafe { (*self.slot.get()).map(|(irq, _)| irq) };
		cpu::restore(saved);
		current
	}

	/*
	 * fire - Entry from the FIQ vector
	 *
	 * Returns false for a spurious FIQ with nothing installed.
	 */
	pub fn fire(&self) -> bool {
		match unsafe { *self.slot.get() } {
			Some((_, routine)) => {
				routine();
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hal::io::read32;
	use intc::{Bcm2835Intc, REGISTER_BLOCK_SIZE};
	use std::sync::atomic::{AtomicU32, Ordering};

	const FIQ_CONTROL: usize = 0x0C;
	const DISABLE_IRQS_2: usize = 0x20;
	const DISABLE_BASIC_IRQS: usize = 0x24;

	#[test]
	fn trap_offsets_round_trip_through_the_vector_table() {
		for trap in [
			Trap::Reset,
			Trap::UndefinedInstruction,
			Trap::SupervisorCall,
			Trap::PrefetchAbort,
			Trap::DataAbort,
			Trap::Unused,
		] {
			assert_eq!(Trap::from_vector_offset(trap.vector_offset()), Some(trap));
		}
		// 0x18 is IRQ and 0x1C is FIQ; neither is a trap.
		assert_eq!(Trap::from_vector_offset(0x18), None);
		assert_eq!(Trap::from_vector_offset(0x1C), None);
		assert_eq!(Trap::DataAbort.to_string(), "data abort");
	}

	#[test]
	fn fast_irq_slot_routes_and_fires() {
		let _cpu = crate::tests::cpu_lock();
		static FIRED: AtomicU32 = AtomicU32::new(0);
		fn routine() {
			FIRED.fetch_add(1, Ordering::SeqCst);
		}

		let mut regs = [0u32; REGISTER_BLOCK_SIZE / 4];
		let base = regs.as_mut_ptr() as usize;
		let intc = unsafe { Bcm2835Intc::new(base) };
		let fiq = FastIrq::new();

		assert!(!fiq.fire());
		assert_eq!(fiq.install(Irq::ARM_TIMER, routine, &intc), None);
		assert_eq!(unsafe { read32(base + FIQ_CONTROL) }, 0x80 | 64);
		assert_eq!(unsafe { read32(base + DISABLE_BASIC_IRQS) }, 1);
		assert_eq!(fiq.source(), Some(Irq::ARM_TIMER));

		assert!(fiq.fire());
		assert_eq!(FIRED.load(Ordering::SeqCst), 1);

		assert_eq!(fiq.install(Irq::UART, routine, &intc), Some(Irq::ARM_TIMER));
		assert_eq!(unsafe { read32(base + DISABLE_IRQS_2) }, Irq::UART.mask());
		assert_eq!(fiq.remove(&intc), Some(Irq::UART));
		assert_eq!(unsafe { read32(base + FIQ_CONTROL) }, 0);
		assert!(!fiq.fire());
	}
}
