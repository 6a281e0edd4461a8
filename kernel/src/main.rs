#![cfg_attr(target_os = "none", no_std, no_main)]
#![cfg_attr(not(target_os = "none"), allow(dead_code))]

mod board_info;
mod boot;
mod commands;

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use hal::gpio::{Led, OutputPin};
use hal::log::{self, LogLevel};
use hal::serial::{MiniUart, SerialConfig};
use hal::sync::IrqMutex;
use hal::{board, cpu, log_info, serial_println};
use intc::timer::{ArmTimer, TimerConfig};
use intc::{Bcm2835Intc, Irq, IrqController};
use lazy_static::lazy_static;
use sip::Protocol;
use vectors::Vectors;
use vectors::traps::FastIrq;

const LOG_ORIGIN: &str = "kernel";

pub static INTC: Bcm2835Intc = Bcm2835Intc::board();
pub static VECTORS: Vectors = Vectors::new();
pub static FAST_IRQ: FastIrq = FastIrq::new();

//Timer interrupts since boot
pub static TICKS: AtomicU32 = AtomicU32::new(0);
//Whether the timer blinks the LED; the LED command can take it over
pub static HEARTBEAT: AtomicBool = AtomicBool::new(true);

lazy_static! {
	pub static ref LED: IrqMutex<Led> = IrqMutex::new(Led::activity());
	pub static ref PROTOCOL: Protocol = {
		let protocol = Protocol::new();
		commands::register_builtins(&protocol);
		protocol
	};
}

static TIMER_HANDLER: fn(Irq, usize) = timer_tick;
static UART_RX_HANDLER: fn(Irq, usize) = uart_rx;

/*
 * timer_tick - ARM timer interrupt
 * @context: Base address of the timer block
 */
fn timer_tick(_irq: Irq, context: usize) {
	unsafe { ArmTimer::new(context) }.clear_irq();
	TICKS.fetch_add(1, Ordering::Relaxed);
	if HEARTBEAT.load(Ordering::Relaxed) {
		LED.lock().toggle();
	}
}

/*
 * uart_rx - AUX interrupt: hand every received byte to the protocol
 * @context: Base address of the AUX block
 *
 * Runs in IRQ context. The built-in commands print, so the console
 * IrqMutex is taken here too; main-line holders of that lock keep IRQs
 * masked, so this handler can never spin on a lock held by the code it
 * interrupted. FIQ routines get no such guarantee.
 */
fn uart_rx(_irq: Irq, context: usize) {
	let mut rx = unsafe { MiniUart::new(context) };
	PROTOCOL.drain(&mut rx);
}

#[unsafe(no_mangle)]
pub extern "C" fn kernel_main() -> ! {
	lazy_static::initialize(&LED);
	hal::init_serial(SerialConfig::default());
	log::set_level(LogLevel::Info);
	INTC.init();
	ArmTimer::board().init(TimerConfig::default());

	serial_println!("Raspberry Pi command core");
	board_info::report();

	lazy_static::initialize(&PROTOCOL);
	VECTORS.register(Irq::ARM_TIMER, &TIMER_HANDLER, board::ARM_TIMER_BASE);
	VECTORS.register(Irq::AUX, &UART_RX_HANDLER, board::AUX_BASE);
	INTC.enable(Irq::AUX);

	log_info!(LOG_ORIGIN, "waiting for frames on the mini UART");
	cpu::enable_interrupts();
	loop {
		cpu::wait_for_interrupt();
	}
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
	hal::log_error!("panic", "{}", info.message());
	if let Some(loc) = info.location() {
		serial_println!("Location: {}:{}", loc.file(), loc.line());
	}
	util::panic::halt_with(&mut Led::activity())
}

#[cfg(not(target_os = "none"))]
fn main() {}
