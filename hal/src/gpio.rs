/*
 * GPIO Controller
 *
 * Pin function selection, output set/clear, pull-up/down sequencing and the
 * board activity LED.
 */

use crate::board;
use crate::cpu::spin_cycles;
use crate::io::Mmio;

/* Register offsets */
const GPFSEL0: usize = 0x00;
const GPSET0: usize = 0x1C;
const GPCLR0: usize = 0x28;
const GPLEV0: usize = 0x34;
const GPPUD: usize = 0x94;
const GPPUDCLK0: usize = 0x98;

pub const PIN_COUNT: u32 = 54;

/* Settle time the datasheet asks for around GPPUD/GPPUDCLK writes */
const PULL_SETTLE_CYCLES: u32 = 150;

/*
 * enum Function - GPFSEL encodings
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Function {
	Input = 0b000,
	Output = 0b001,
	Alt0 = 0b100,
	Alt1 = 0b101,
	Alt2 = 0b110,
	Alt3 = 0b111,
	Alt4 = 0b011,
	Alt5 = 0b010,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Pull {
	Off = 0,
	Down = 1,
	Up = 2,
}

/*
 * trait OutputPin - Anything that can drive a single digital output
 */
pub trait OutputPin {
	fn set_high(&mut self);
	fn set_low(&mut self);
	fn toggle(&mut self);
}

#[derive(Clone, Copy, Debug)]
pub struct Gpio {
	regs: Mmio,
}

impl Gpio {
	/*
	 * new - Wrap the GPIO register block at @base
	 */
	pub const unsafe fn new(base: usize) -> Self {
		Gpio {
			regs: unsafe { Mmio::new(base) },
		}
	}

	/*
	 * board - GPIO block at the configured board address
	 */
	pub const fn board() -> Self {
		unsafe { Gpio::new(board::GPIO_BASE) }
	}

	/*
	 * set_function - Select the function of one pin
	 * @pin: BCM pin number (0-53)
	 * @function: Function to select
	 *
	 * Out-of-range pins are ignored.
	 */
	pub fn set_function(&self, pin: u32, function: Function) {
		if pin >= PIN_COUNT {
			return;
		}
		let reg = GPFSEL0 + (pin / 10) as usize * 4;
		let shift = (pin % 10) * 3;
		self.regs.modify(reg, |v| (v & !(0b111 << shift)) | ((function as u32) << shift));
	}

	pub fn set(&self, pin: u32) {
		if pin < PIN_COUNT {
			self.regs.write(GPSET0 + (pin / 32) as usize * 4, 1 << (pin % 32));
		}
	}

	pub fn clear(&self, pin: u32) {
		if pin < PIN_COUNT {
			self.regs.write(GPCLR0 + (pin / 32) as usize * 4, 1 << (pin % 32));
		}
	}

	pub fn level(&self, pin: u32) -> bool {
		pin < PIN_COUNT && self.regs.read(GPLEV0 + (pin / 32) as usize * 4) & (1 << (pin % 32)) != 0
	}

	/*
	 * set_pull - Apply a pull setting to the bank-0 pins in @mask
	 *
	 * Control is written first, then clocked into the selected pins, then
	 * both are released, with the required settle time between steps.
	 */
	pub fn set_pull(&self, mask: u32, pull: Pull) {
		self.regs.write(GPPUD, pull as u32);
		spin_cycles(PULL_SETTLE_CYCLES);
		self.regs.write(GPPUDCLK0, mask);
		spin_cycles(PULL_SETTLE_CYCLES);
		self.regs.write(GPPUD, Pull::Off as u32);
		self.regs.write(GPPUDCLK0, 0);
	}
}

/*
 * struct Led - A single LED on a GPIO output
 * @active_low: LED lights when the pin is driven low
 */
#[derive(Clone, Copy, Debug)]
pub struct Led {
	gpio: Gpio,
	pin: u32,
	active_low: bool,
	lit: bool,
}

impl Led {
	/*
	 * new - Configure @pin as an output and start with the LED off
	 */
	pub fn new(gpio: Gpio, pin: u32, active_low: bool) -> Self {
		gpio.set_function(pin, Function::Output);
		let mut led = Led {
			gpio,
			pin,
			active_low,
			lit: true,
		};
		led.set_low();
		led
	}

	/*
	 * activity - The board's ACT LED
	 */
	pub fn activity() -> Self {
		Led::new(Gpio::board(), board::ACT_LED_PIN, board::ACT_LED_ACTIVE_LOW)
	}

	pub fn is_lit(&self) -> bool {
		self.lit
	}

	fn drive(&mut self, lit: bool) {
		if lit != self.active_low {
			self.gpio.set(self.pin);
		} else {
			self.gpio.clear(self.pin);
		}
		self.lit = lit;
	}
}

impl OutputPin for Led {
	fn set_high(&mut self) {
		self.drive(true);
	}

	fn set_low(&mut self) {
		self.drive(false);
	}

	fn toggle(&mut self) {
		self.drive(!self.lit);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::read32;

	const WORDS: usize = 0xA0 / 4;

	fn reg(base: usize, offset: usize) -> u32 {
		unsafe { read32(base + offset) }
	}

	#[test]
	fn function_select_touches_only_its_field() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let gpio = unsafe { Gpio::new(base) };

		gpio.set_function(14, Function::Alt5);
		gpio.set_function(15, Function::Alt5);
		gpio.set_function(47, Function::Output);
		gpio.set_function(99, Function::Output);

		assert_eq!(reg(base, 0x04), (0b010 << 12) | (0b010 << 15));
		assert_eq!(reg(base, 0x10), 0b001 << 21);

		gpio.set_function(14, Function::Input);
		assert_eq!(reg(base, 0x04), 0b010 << 15);
	}

	#[test]
	fn led_honours_polarity() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let gpio = unsafe { Gpio::new(base) };

		let mut led = Led::new(gpio, 16, true);
		assert!(!led.is_lit());
		assert_eq!(reg(base, GPSET0), 1 << 16);

		led.toggle();
		assert!(led.is_lit());
		assert_eq!(reg(base, GPCLR0), 1 << 16);

		let mut high = Led::new(gpio, 47, false);
		high.set_high();
		assert_eq!(reg(base, GPSET0 + 4), 1 << 15);
	}

	#[test]
	fn pull_sequence_releases_clock() {
		let mut regs = [0u32; WORDS];
		let base = regs.as_mut_ptr() as usize;
		let gpio = unsafe { Gpio::new(base) };

		gpio.set_pull((1 << 14) | (1 << 15), Pull::Off);
		assert_eq!(reg(base, GPPUD), 0);
		assert_eq!(reg(base, GPPUDCLK0), 0);
	}
}
