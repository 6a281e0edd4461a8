/*
 * ARM Timer (SP804-derived)
 *
 * Periodic interrupt source on the basic tier (Irq::ARM_TIMER).
 */

use hal::board;
use hal::io::Mmio;

const LOAD: usize = 0x00;
const VALUE: usize = 0x04;
const CONTROL: usize = 0x08;
const IRQ_CLEAR: usize = 0x0C;
const RAW_IRQ: usize = 0x10;

pub const CTRL_23BIT: u32 = 1 << 1;
pub const CTRL_INT_ENABLE: u32 = 1 << 5;
pub const CTRL_ENABLE: u32 = 1 << 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescale {
	Div1 = 0b00,
	Div16 = 0b01,
	Div256 = 0b10,
}

impl Prescale {
	const fn bits(&self) -> u32 {
		(*self as u32) << 2
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
	pub load: u32,
	pub prescale: Prescale,
}

impl Default for TimerConfig {
	fn default() -> Self {
		TimerConfig {
			load: 0x800,
			prescale: Prescale::Div256,
		}
	}
}

pub struct ArmTimer {
	regs: Mmio,
}

impl ArmTimer {
	pub const unsafe fn new(base: usize) -> Self {
		ArmTimer {
			regs: unsafe { Mmio::new(base) },
		}
	}

	pub const fn board() -> Self {
		unsafe { ArmTimer::new(board::ARM_TIMER_BASE) }
	}

	/*
	 * init - Start the timer counting down from @config.load with its
	 * interrupt enabled
	 */
	pub fn init(&self, config: TimerConfig) {
		self.regs.write(LOAD, config.load);
		self.regs.write(
			CONTROL,
			CTRL_23BIT | CTRL_ENABLE | CTRL_INT_ENABLE | config.prescale.bits(),
		);
	}

	/*
	 * clear_irq - Acknowledge the interrupt so the line drops
	 */
	pub fn clear_irq(&self) {
		self.regs.write(IRQ_CLEAR, 1);
	}

	pub fn value(&self) -> u32 {
		self.regs.read(VALUE)
	}

	pub fn irq_raised(&self) -> bool {
		self.regs.read(RAW_IRQ) & 1 != 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hal::io::read32;

	#[test]
	fn init_programs_load_and_control() {
		let mut regs = [0u32; 9];
		let base = regs.as_mut_ptr() as usize;
		let timer = unsafe { ArmTimer::new(base) };

		timer.init(TimerConfig::default());
		timer.clear_irq();

		unsafe {
			assert_eq!(read32(base + LOAD), 0x800);
			assert_eq!(read32(base + CONTROL), 0x02 | 0x80 | 0x20 | 0x08);
			assert_eq!(read32(base + IRQ_CLEAR), 1);
		}
		assert!(!timer.irq_raised());
	}
}
