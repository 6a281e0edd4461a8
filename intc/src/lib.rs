/*
 * BCM2835 Interrupt Controller Driver
 *
 * The ARM-side controller exposes 72 IRQ sources in three tiers:
 * - tier A: GPU sources 0-31 (pending 1 / enable 1 / disable 1)
 * - tier B: GPU sources 32-63 (pending 2 / enable 2 / disable 2)
 * - basic:  ARM-local sources 64-71 (basic pending bits 0-7)
 *
 * Basic pending also carries summary bits 8 and 9 saying whether tier A or
 * tier B have anything pending.
 */

#![cfg_attr(not(test), no_std)]

use core::fmt;

use hal::board;
use hal::io::Mmio;
use hal::log_info;

pub mod timer;

const LOG_ORIGIN: &str = "intc";

/* Register offsets from the controller base */
const IRQ_BASIC_PENDING: usize = 0x00;
const IRQ_PENDING_1: usize = 0x04;
const IRQ_PENDING_2: usize = 0x08;
const FIQ_CONTROL: usize = 0x0C;
const ENABLE_IRQS_1: usize = 0x10;
const ENABLE_IRQS_2: usize = 0x14;
const ENABLE_BASIC_IRQS: usize = 0x18;
const DISABLE_IRQS_1: usize = 0x1C;
const DISABLE_IRQS_2: usize = 0x20;
const DISABLE_BASIC_IRQS: usize = 0x24;

/* Size of the register block in bytes */
pub const REGISTER_BLOCK_SIZE: usize = 0x28;

/* Summary bits in basic pending */
pub const BASIC_PENDING_1: u32 = 1 << 8;
pub const BASIC_PENDING_2: u32 = 1 << 9;
/* ARM-local pending field in basic pending */
pub const BASIC_LOCAL_MASK: u32 = 0xFF;

const FIQ_ENABLE: u32 = 1 << 7;

/* Total number of interrupt identifiers */
pub const IRQ_COUNT: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
	/* Identifier outside 0-71 */
	OutOfRange(u32),
}

impl fmt::Display for IrqError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IrqError::OutOfRange(n) => write!(f, "interrupt {} out of range (0-{})", n, IRQ_COUNT - 1),
		}
	}
}

/*
 * enum Tier - Register group governing an interrupt identifier
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
	A,
	B,
	Basic,
}

impl Tier {
	pub const fn of(irq: Irq) -> Tier {
		irq.tier()
	}

	/* First identifier of the tier */
	pub const fn base(&self) -> u32 {
		match self {
			Tier::A => 0,
			Tier::B => 32,
			Tier::Basic => 64,
		}
	}

	const fn enable_reg(&self) -> usize {
		match self {
			Tier::A => ENABLE_IRQS_1,
			Tier::B => ENABLE_IRQS_2,
			Tier::Basic => ENABLE_BASIC_IRQS,
		}
	}

	const fn disable_reg(&self) -> usize {
		match self {
			Tier::A => DISABLE_IRQS_1,
			Tier::B => DISABLE_IRQS_2,
			Tier::Basic => DISABLE_BASIC_IRQS,
		}
	}
}

/*
 * struct Irq - A validated global interrupt identifier (0-71)
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Irq(u8);

impl Irq {
	pub const AUX: Irq = Irq(29);
	pub const I2C_SPI_SLAVE: Irq = Irq(43);
	pub const PWA0: Irq = Irq(45);
	pub const PWA1: Irq = Irq(46);
	pub const SMI: Irq = Irq(48);
	pub const GPIO_0: Irq = Irq(49);
	pub const GPIO_1: Irq = Irq(50);
	pub const GPIO_2: Irq = Irq(51);
	pub const GPIO_3: Irq = Irq(52);
	pub const I2C: Irq = Irq(53);
	pub const SPI: Irq = Irq(54);
	pub const PCM: Irq = Irq(55);
	pub const UART: Irq = Irq(57);
	pub const ARM_TIMER: Irq = Irq(64);
	pub const ARM_MAILBOX: Irq = Irq(65);
	pub const DOORBELL_0: Irq = Irq(66);
	pub const DOORBELL_1: Irq = Irq(67);
	pub const GPU0_HALTED: Irq = Irq(68);
	pub const GPU1_HALTED: Irq = Irq(69);
	pub const ILLEGAL_ACCESS_1: Irq = Irq(70);
	pub const ILLEGAL_ACCESS_0: Irq = Irq(71);

	/*
	 * new - Validate a raw identifier
	 * @n: Global interrupt number
	 *
	 * Returns IrqError::OutOfRange for anything past the basic tier.
	 */
	pub const fn new(n: u32) -> Result<Irq, IrqError> {
		if n < IRQ_COUNT as u32 {
			Ok(Irq(n as u8))
		} else {
			Err(IrqError::OutOfRange(n))
		}
	}

	/*
	 * from_tier_bit - Identifier for @bit of @tier's pending mask
	 */
	pub const fn from_tier_bit(tier: Tier, bit: u32) -> Result<Irq, IrqError> {
		Irq::new(tier.base() + bit)
	}

	pub const fn number(&self) -> u32 {
		self.0 as u32
	}

	pub const fn index(&self) -> usize {
		self.0 as usize
	}

	pub const fn tier(&self) -> Tier {
		if self.0 <= 31 {
			Tier::A
		} else if self.0 <= 63 {
			Tier::B
		} else {
			Tier::Basic
		}
	}

	/* Bit position within the tier's registers */
	pub const fn bit(&self) -> u32 {
		self.0 as u32 % 32
	}

	pub const fn mask(&self) -> u32 {
		1 << self.bit()
	}
}

impl TryFrom<u32> for Irq {
	type Error = IrqError;

	fn try_from(n: u32) -> Result<Self, Self::Error> {
		Irq::new(n)
	}
}

impl fmt::Display for Irq {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "IRQ{}", self.0)
	}
}

/*
 * trait IrqController - What the dispatcher and drivers need from the hardware
 */
pub trait IrqController {
	fn enable(&self, irq: Irq);
	fn disable(&self, irq: Irq);
	/* Raw basic pending register: summary bits plus the ARM-local field */
	fn basic_pending(&self) -> u32;
	/* Pending mask for one tier; for Basic this is the ARM-local field */
	fn pending(&self, tier: Tier) -> u32;
	/* Route one source to FIQ, or stop routing anything */
	fn route_fiq(&self, irq: Option<Irq>);
}

/*
 * struct Bcm2835Intc - Memory-mapped ARM interrupt controller
 */
pub struct Bcm2835Intc {
	regs: Mmio,
}

impl Bcm2835Intc {
	/*
	 * new - Wrap the register block at @base
	 *
	 * @base must map REGISTER_BLOCK_SIZE bytes of controller registers.
	 */
	pub const unsafe fn new(base: usize) -> Self {
		Bcm2835Intc {
			regs: unsafe { Mmio::new(base) },
		}
	}

	pub const fn board() -> Self {
		unsafe { Bcm2835Intc::new(board::INTC_BASE) }
	}

	/*
	 * init - Put the controller in a known state
	 *
	 * Disables every source and FIQ routing, then enables the ARM timer.
	 */
	pub fn init(&self) {
		self.regs.write(FIQ_CONTROL, 0);
		self.regs.write(DISABLE_IRQS_1, u32::MAX);
		self.regs.write(DISABLE_IRQS_2, u32::MAX);
		self.regs.write(DISABLE_BASIC_IRQS, BASIC_LOCAL_MASK);
		self.enable(Irq::ARM_TIMER);
		log_info!(LOG_ORIGIN, "controller at {:#x} initialised", self.regs.base());
	}
}

impl IrqController for Bcm2835Intc {
	fn enable(&self, irq: Irq) {
		self.regs.write(irq.tier().enable_reg(), irq.mask());
	}

	fn disable(&self, irq: Irq) {
		self.regs.write(irq.tier().disable_reg(), irq.mask());
	}

	fn basic_pending(&self) -> u32 {
		self.regs.read(IRQ_BASIC_PENDING)
	}

	fn pending(&self, tier: Tier) -> u32 {
		match tier {
			Tier::A => self.regs.read(IRQ_PENDING_1),
			Tier::B => self.regs.read(IRQ_PENDING_2),
			Tier::Basic => self.regs.read(IRQ_BASIC_PENDING) & BASIC_LOCAL_MASK,
		}
	}

	fn route_fiq(&self, irq: Option<Irq>) {
		match irq {
			Some(irq) => self.regs.write(FIQ_CONTROL, FIQ_ENABLE | irq.number()),
			None => self.regs.write(FIQ_CONTROL, 0),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hal::io::{read32, write32};

	const WORDS: usize = REGISTER_BLOCK_SIZE / 4;

	fn reg(base: usize, offset: usize) -> u32 {
		unsafe { read32(base + offset) }
	}

	#[test]
	fn identifiers_map_to_tiers() {
		assert_eq!(Irq::new(0).map(|i| i.tier()), Ok(Tier::A));
		assert_eq!(Irq::new(31).map(|i| i.tier()), Ok(Tier::A));
		assert_eq!(Irq::new(32).map(|i| i.tier()), Ok(Tier::B));
		assert_eq!(Irq::new(63).map(|i| i.tier()), Ok(Tier::B));
		assert_eq!(Irq::new(64).map(|i| i.tier()), Ok(Tier::Basic));
		assert_eq!(Irq::new(71).map(|i| i.tier()), Ok(Tier::Basic));
		assert_eq!(Irq::new(72), Err(IrqError::OutOfRange(72)));
		assert_eq!(Irq::try_from(u32::MAX), Err(IrqError::OutOfRange(u32::MAX)));

		assert_eq!(Irq::UART.mask(), 1 << 25);
		assert_eq!(Irq::ARM_TIMER.bit(), 0);
		assert_eq!(Irq::from_tier_bit(Tier::B, 25), Ok(Irq::UART));
		assert_eq!(Tier::of(Irq::ARM_TIMER), Tier::Basic);
	}

	#[test]
	fn enable_and_disable_hit_the_tier_registers() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let intc = unsafe { Bcm2835Intc::new(base) };

		intc.enable(Irq::AUX);
		intc.enable(Irq::UART);
		intc.enable(Irq::DOORBELL_0);
		assert_eq!(reg(base, ENABLE_IRQS_1), 1 << 29);
		assert_eq!(reg(base, ENABLE_IRQS_2), 1 << 25);
		assert_eq!(reg(base, ENABLE_BASIC_IRQS), 1 << 2);

		intc.disable(Irq::AUX);
		intc.disable(Irq::UART);
		intc.disable(Irq::ARM_TIMER);
		assert_eq!(reg(base, DISABLE_IRQS_1), 1 << 29);
		assert_eq!(reg(base, DISABLE_IRQS_2), 1 << 25);
		assert_eq!(reg(base, DISABLE_BASIC_IRQS), 1 << 0);
	}

	#[test]
	fn init_masks_everything_but_the_timer() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let intc = unsafe { Bcm2835Intc::new(base) };
		unsafe { write32(base + FIQ_CONTROL, FIQ_ENABLE | 57) };

		intc.init();
		assert_eq!(reg(base, FIQ_CONTROL), 0);
		assert_eq!(reg(base, DISABLE_IRQS_1), u32::MAX);
		assert_eq!(reg(base, DISABLE_IRQS_2), u32::MAX);
		assert_eq!(reg(base, DISABLE_BASIC_IRQS), 0xFF);
		assert_eq!(reg(base, ENABLE_BASIC_IRQS), 1);
	}

	#[test]
	fn pending_reads_split_the_basic_register() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let intc = unsafe { Bcm2835Intc::new(base) };
		unsafe {
			write32(base + IRQ_BASIC_PENDING, BASIC_PENDING_2 | 0b101);
			write32(base + IRQ_PENDING_2, 1 << 25);
		}

		assert_eq!(intc.basic_pending(), BASIC_PENDING_2 | 0b101);
		assert_eq!(intc.pending(Tier::Basic), 0b101);
		assert_eq!(intc.pending(Tier::B), 1 << 25);
		assert_eq!(intc.pending(Tier::A), 0);
	}

	#[test]
	fn fiq_routing() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let intc = unsafe { Bcm2835Intc::new(base) };

		intc.route_fiq(Some(Irq::ARM_TIMER));
		assert_eq!(reg(base, FIQ_CONTROL), 0x80 | 64);
		intc.route_fiq(None);
		assert_eq!(reg(base, FIQ_CONTROL), 0);
	}
}
