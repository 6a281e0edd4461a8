use core::fmt::Write;

use crate::board;
use crate::gpio::{Function, Gpio, Pull};
use crate::io::Mmio;
use crate::sync::IrqMutex;

//AUX register offsets
const AUX_ENABLES: usize = 0x04;    //Peripheral enables
const MU_IO: usize = 0x40;          //Data register
const MU_IER: usize = 0x44;         //Interrupt enable register
const MU_IIR: usize = 0x48;         //Interrupt identify / FIFO clear
const MU_LCR: usize = 0x4C;         //Line control register
const MU_MCR: usize = 0x50;         //Modem control register
const MU_LSR: usize = 0x54;         //Line status register
const MU_CNTL: usize = 0x60;        //Extra control register
const MU_BAUD: usize = 0x68;        //Baud rate register

const AUX_ENA_MINIUART: u32 = 1 << 0;
const MU_LCR_8BIT: u32 = 0x3;
const MU_IER_RX: u32 = 0x5;
const MU_IIR_CLEAR_FIFOS: u32 = 0xC6;
const MU_LSR_DATA_READY: u32 = 1 << 0;
const MU_LSR_TX_EMPTY: u32 = 1 << 5;
const MU_CNTL_RX_ENABLE: u32 = 1 << 0;
const MU_CNTL_TX_ENABLE: u32 = 1 << 1;

const TXD_PIN: u32 = 14;
const RXD_PIN: u32 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBits {
	Seven,
	Eight,
}

//Line settings applied by MiniUart::init
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
	pub baud: u32,
	pub data_bits: DataBits,
	pub rx_interrupt: bool,
}

impl Default for SerialConfig {
	fn default() -> Self {
		SerialConfig {
			baud: 115_200,
			data_bits: DataBits::Eight,
			rx_interrupt: true,
		}
	}
}

//Mini UART baud register value for the given core clock
pub const fn baud_divisor(sys_clock_hz: u32, baud: u32) -> u32 {
	(sys_clock_hz / (8 * baud)).saturating_sub(1)
}

//Byte-oriented receive side of a UART
pub trait ByteSource {
	//Spin until a byte arrives
	fn read_blocking(&mut self) -> u8;
	//Take a byte if one is waiting
	fn try_read(&mut self) -> Option<u8>;
}

pub struct MiniUart {
	regs: Mmio,
}

impl MiniUart {
	pub const unsafe fn new(base: usize) -> Self {
		MiniUart {
			regs: unsafe { Mmio::new(base) },
		}
	}

	//AUX block at the configured board address
	pub const fn board() -> Self {
		unsafe { MiniUart::new(board::AUX_BASE) }
	}

	//Bring the port up: line settings, FIFOs, baud, pins, then TX/RX
	pub fn init(&self, config: SerialConfig, gpio: &Gpio) {
		self.regs.write(AUX_ENABLES, AUX_ENA_MINIUART);
		self.regs.write(MU_IER, 0);
		self.regs.write(MU_CNTL, 0);

		let lcr = match config.data_bits {
			DataBits::Eight => MU_LCR_8BIT,
			DataBits::Seven => 0,
		};
		self.regs.write(MU_LCR, lcr);
		self.regs.write(MU_MCR, 0);
		self.regs.write(MU_IER, if config.rx_interrupt { MU_IER_RX } else { 0 });
		self.regs.write(MU_IIR, MU_IIR_CLEAR_FIFOS);
		self.regs.write(MU_BAUD, baud_divisor(board::SYS_CLOCK_HZ, config.baud));

		gpio.set_function(RXD_PIN, Function::Alt5);
		gpio.set_function(TXD_PIN, Function::Alt5);
		gpio.set_pull((1 << TXD_PIN) | (1 << RXD_PIN), Pull::Off);

		self.regs.write(MU_CNTL, MU_CNTL_TX_ENABLE | MU_CNTL_RX_ENABLE);
	}

	fn is_transmit_empty(&self) -> bool {
		self.regs.read(MU_LSR) & MU_LSR_TX_EMPTY != 0
	}

	pub fn data_ready(&self) -> bool {
		self.regs.read(MU_LSR) & MU_LSR_DATA_READY != 0
	}

	//Write a single byte to serial port
	pub fn write_byte(&self, byte: u8) {
		while !self.is_transmit_empty() {
			core::hint::spin_loop();
		}
		self.regs.write(MU_IO, byte as u32);
	}

	//Write a string to serial port
	pub fn write_str(&self, s: &str) {
		for byte in s.bytes() {
			self.write_byte(byte);
		}
	}
}

impl ByteSource for MiniUart {
	fn read_blocking(&mut self) -> u8 {
		while !self.data_ready() {
			core::hint::spin_loop();
		}
		(self.regs.read(MU_IO) & 0xFF) as u8
	}

	fn try_read(&mut self) -> Option<u8> {
		if self.data_ready() {
			Some((self.regs.read(MU_IO) & 0xFF) as u8)
		} else {
			None
		}
	}
}

//Global serial console (lazy init)
use spin::Once;

static SERIAL_PORT: Once<IrqMutex<MiniUart>> = Once::new();

//Init the global console on the board's mini UART
pub fn init_serial(config: SerialConfig) {
	SERIAL_PORT.call_once(|| {
		let uart = MiniUart::board();
		uart.init(config, &Gpio::board());
		IrqMutex::new(uart)
	});
}

//Write string to serial port (interrupt-safe)
pub fn serial_print(s: &str) {
	if let Some(serial) = SERIAL_PORT.get() {
		let port = serial.lock();
		port.write_str(s);
	}
}

//Serial print macro
#[macro_export]
macro_rules! serial_print {
	($($arg:tt)*) => {$crate::serial::_serial_print(format_args!($($arg)*))
	};
}

//Serial println macro
#[macro_export]
macro_rules! serial_println {
	()=>($crate::serial_print!("\r\n"));
	($($arg:tt)*) => {$crate::serial_print!("{}\r\n", format_args!($($arg)*))
	};
}

//Internal function for serial printing with formatting
pub fn _serial_print(args: core::fmt::Arguments) {
	struct SerialWriter;

	impl Write for SerialWriter {
		fn write_str(&mut self, s: &str) -> core::fmt::Result {
			serial_print(s);
			Ok(())
		}
	}
	SerialWriter.write_fmt(args).ok();
}
