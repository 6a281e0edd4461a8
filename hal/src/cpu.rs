/*
 * CPU Control Functions
 *
 * IRQ/FIQ masking and low-power waiting for the ARM core.
 *
 * On non-ARM builds (host unit tests) the CPSR mask bits are emulated with
 * an atomic so that masking discipline stays observable.
 */

/* CPSR mask bits */
pub const CPSR_IRQ_MASK: u32 = 1 << 7;
pub const CPSR_FIQ_MASK: u32 = 1 << 6;

/*
 * struct IrqState - Mask bits saved by mask_irq()/mask_all()
 *
 * Hand it back to restore() to undo exactly what the save changed.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct IrqState(u32);

impl IrqState {
	pub const fn irq_was_enabled(&self) -> bool {
		self.0 & CPSR_IRQ_MASK == 0
	}

	pub const fn fiq_was_enabled(&self) -> bool {
		self.0 & CPSR_FIQ_MASK == 0
	}
}

#[cfg(target_arch = "arm")]
mod imp {
	use core::arch::asm;

	#[inline(always)]
	pub fn read_cpsr() -> u32 {
		let cpsr: u32;
		unsafe { asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack, preserves_flags)) };
		cpsr
	}

	#[inline(always)]
	pub fn irq_enable() {
		unsafe { asm!("cpsie i", options(nomem, nostack)) };
	}

	#[inline(always)]
	pub fn irq_disable() {
		unsafe { asm!("cpsid i", options(nomem, nostack)) };
	}

	#[inline(always)]
	pub fn fiq_enable() {
		unsafe { asm!("cpsie f", options(nomem, nostack)) };
	}

	#[inline(always)]
	pub fn fiq_disable() {
		unsafe { asm!("cpsid f", options(nomem, nostack)) };
	}

	#[inline(always)]
	pub fn wfi() {
		unsafe { asm!("wfi", options(nomem, nostack)) };
	}
}

#[cfg(not(target_arch = "arm"))]
mod imp {
	use super::{CPSR_FIQ_MASK, CPSR_IRQ_MASK};
	use core::sync::atomic::{AtomicU32, Ordering};

	/* Out of reset both IRQ and FIQ are masked */
	static CPSR: AtomicU32 = AtomicU32::new(CPSR_IRQ_MASK | CPSR_FIQ_MASK);

	pub fn read_cpsr() -> u32 {
		CPSR.load(Ordering::SeqCst)
	}

	pub fn irq_enable() {
		CPSR.fetch_and(!CPSR_IRQ_MASK, Ordering::SeqCst);
	}

	pub fn irq_disable() {
		CPSR.fetch_or(CPSR_IRQ_MASK, Ordering::SeqCst);
	}

	pub fn fiq_enable() {
		CPSR.fetch_and(!CPSR_FIQ_MASK, Ordering::SeqCst);
	}

	pub fn fiq_disable() {
		CPSR.fetch_or(CPSR_FIQ_MASK, Ordering::SeqCst);
	}

	pub fn wfi() {
		core::hint::spin_loop();
	}
}

/*
 * enable_interrupts - Unmask IRQs on the core
 */
#[inline(always)]
pub fn enable_interrupts() {
	imp::irq_enable();
}

/*
 * disable_interrupts - Mask IRQs on the core
 */
#[inline(always)]
pub fn disable_interrupts() {
	imp::irq_disable();
}

#[inline(always)]
pub fn enable_fiq() {
	imp::fiq_enable();
}

#[inline(always)]
pub fn disable_fiq() {
	imp::fiq_disable();
}

/*
 * interrupts_enabled - Whether IRQs are currently unmasked
 */
#[inline(always)]
pub fn interrupts_enabled() -> bool {
	imp::read_cpsr() & CPSR_IRQ_MASK == 0
}

/*
 * mask_irq - Save the mask state and mask IRQs
 *
 * Returns the state to pass to restore().
 */
#[inline(always)]
pub fn mask_irq() -> IrqState {
	let state = IrqState(imp::read_cpsr() & (CPSR_IRQ_MASK | CPSR_FIQ_MASK));
	imp::irq_disable();
	state
}

/*
 * mask_all - Save the mask state and mask both IRQs and FIQs
 */
#[inline(always)]
pub fn mask_all() -> IrqState {
	let state = IrqState(imp::read_cpsr() & (CPSR_IRQ_MASK | CPSR_FIQ_MASK));
	imp::irq_disable();
	imp::fiq_disable();
	state
}

/*
 * restore - Re-enable whatever the matching save had found enabled
 * @state: Value returned by mask_irq() or mask_all()
 */
#[inline(always)]
pub fn restore(state: IrqState) {
	if state.fiq_was_enabled() {
		imp::fiq_enable();
	}
	if state.irq_was_enabled() {
		imp::irq_enable();
	}
}

/*
 * without_interrupts - Run a closure with IRQs masked
 */
#[inline]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
	let state = mask_irq();
	let ret = f();
	restore(state);
	ret
}

/*
 * wait_for_interrupt - Sleep until the next interrupt
 */
#[inline(always)]
pub fn wait_for_interrupt() {
	imp::wfi();
}

/*
 * spin_cycles - Busy-wait for roughly @cycles iterations
 *
 * Used where the datasheet asks for a fixed settle time (GPIO pull setup).
 */
#[inline(never)]
pub fn spin_cycles(cycles: u32) {
	for _ in 0..cycles {
		core::hint::spin_loop();
	}
}
