/*
 * Hardware Abstraction Layer (HAL)
 *
 * Provides low-level hardware access for the BCM2835/BCM2836 including:
 * - CPU control (IRQ/FIQ masking, wait for interrupt)
 * - Memory-mapped register access
 * - Interrupt-safe locking
 * - GPIO and the activity LED
 * - AUX mini UART serial console
 * - VideoCore mailbox property interface
 * - Levelled serial logging
 */

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod cpu;
pub mod gpio;
pub mod io;
pub mod log;
pub mod mailbox;
pub mod serial;
pub mod sync;

pub use io::*;
pub use serial::{init_serial, serial_print};
pub use sync::IrqMutex;
