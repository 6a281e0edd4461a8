/*
 * Levelled Logging
 *
 * Thin layer over the serial console: every line carries a severity and the
 * subsystem it came from. Lines below the runtime level are dropped before
 * any formatting happens.
 */

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
	Debug = 0,
	Info = 1,
	Warn = 2,
	Error = 3,
}

impl LogLevel {
	pub const fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Debug => "DEBUG",
			LogLevel::Info => "INFO ",
			LogLevel::Warn => "WARN ",
			LogLevel::Error => "ERROR",
		}
	}

	pub const fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(LogLevel::Debug),
			1 => Some(LogLevel::Info),
			2 => Some(LogLevel::Warn),
			3 => Some(LogLevel::Error),
			_ => None,
		}
	}
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn set_level(level: LogLevel) {
	CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> LogLevel {
	LogLevel::from_u8(CURRENT_LEVEL.load(Ordering::Relaxed)).unwrap_or(LogLevel::Info)
}

pub fn enabled(level: LogLevel) -> bool {
	level >= self::level()
}

pub fn _log(level: LogLevel, origin: &str, args: fmt::Arguments, file: &str, line: u32) {
	if !enabled(level) {
		return;
	}
	if level == LogLevel::Debug {
		crate::serial_println!("[{}] [{}] {} ({}:{})", level.as_str(), origin, args, file, line);
	} else {
		crate::serial_println!("[{}] [{}] {}", level.as_str(), origin, args);
	}
}

#[macro_export]
macro_rules! log_debug {
	($origin:expr, $($arg:tt)*) => {
		$crate::log::_log($crate::log::LogLevel::Debug, $origin, format_args!($($arg)*), file!(), line!())
	};
}

#[macro_export]
macro_rules! log_info {
	($origin:expr, $($arg:tt)*) => {
		$crate::log::_log($crate::log::LogLevel::Info, $origin, format_args!($($arg)*), file!(), line!())
	};
}

#[macro_export]
macro_rules! log_warn {
	($origin:expr, $($arg:tt)*) => {
		$crate::log::_log($crate::log::LogLevel::Warn, $origin, format_args!($($arg)*), file!(), line!())
	};
}

#[macro_export]
macro_rules! log_error {
	($origin:expr, $($arg:tt)*) => {
		$crate::log::_log($crate::log::LogLevel::Error, $origin, format_args!($($arg)*), file!(), line!())
	};
}
