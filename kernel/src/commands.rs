use core::sync::atomic::Ordering;

use hal::gpio::OutputPin;
use hal::log::{self, LogLevel};
use hal::{log_info, serial_print, serial_println};
use sip::{CommandHandler, Protocol};

use crate::{HEARTBEAT, LED, TICKS};

const LOG_ORIGIN: &str = "cmd";

pub const CMD_PING: u8 = 0x00;
pub const CMD_ECHO: u8 = 0x01;
pub const CMD_LED: u8 = 0x02;
pub const CMD_TICKS: u8 = 0x03;
pub const CMD_LOG_LEVEL: u8 = 0x04;

//Status codes handed back to the protocol layer
pub const STATUS_OK: i32 = 0;
pub const STATUS_BAD_LENGTH: i32 = -1;
pub const STATUS_BAD_VALUE: i32 = -2;

/* LED command arguments */
const LED_OFF: u8 = 0;
const LED_ON: u8 = 1;
const LED_HEARTBEAT: u8 = 2;

type CommandFn = fn(&[u8]) -> i32;

static BUILTINS: [(u8, &dyn CommandHandler); 5] = [
	(CMD_PING, &(ping as CommandFn)),
	(CMD_ECHO, &(echo as CommandFn)),
	(CMD_LED, &(led as CommandFn)),
	(CMD_TICKS, &(ticks as CommandFn)),
	(CMD_LOG_LEVEL, &(log_level as CommandFn)),
];

pub fn register_builtins(protocol: &Protocol) {
	for &(command, handler) in BUILTINS.iter() {
		protocol.register(command, handler);
	}
}

fn ping(_payload: &[u8]) -> i32 {
	serial_println!("pong");
	STATUS_OK
}

fn echo(payload: &[u8]) -> i32 {
	serial_print!("echo[{}]:", payload.len());
	for byte in payload {
		serial_print!(" {:02X}", byte);
	}
	serial_println!();
	STATUS_OK
}

/*
 * led - Drive the activity LED
 *
 * One argument byte: 0 off, 1 on, 2 hand it back to the timer heartbeat.
 */
fn led(payload: &[u8]) -> i32 {
	let [mode] = payload else {
		return STATUS_BAD_LENGTH;
	};
	match *mode {
		LED_OFF | LED_ON => {
			HEARTBEAT.store(false, Ordering::Relaxed);
			let mut led = LED.lock();
			if *mode == LED_ON {
				led.set_high();
			} else {
				led.set_low();
			}
		}
		LED_HEARTBEAT => HEARTBEAT.store(true, Ordering::Relaxed),
		_ => return STATUS_BAD_VALUE,
	}
	STATUS_OK
}

fn ticks(_payload: &[u8]) -> i32 {
	serial_println!("ticks: {}", TICKS.load(Ordering::Relaxed));
	STATUS_OK
}

//Argument is the LogLevel discriminant, 0 (debug) through 3 (error)
fn log_level(payload: &[u8]) -> i32 {
	let [raw] = payload else {
		return STATUS_BAD_LENGTH;
	};
	match LogLevel::from_u8(*raw) {
		Some(level) => {
			log::set_level(level);
			log_info!(LOG_ORIGIN, "log level now {}", level.as_str());
			STATUS_OK
		}
		None => STATUS_BAD_VALUE,
	}
}
