/*
 * Board Configuration
 *
 * Peripheral addresses and board wiring selected by cargo feature.
 * `rpi1` (BCM2835) wins over the default `rpi2` (BCM2836) when both are set.
 */

/* Base of the memory-mapped peripheral window as seen by the ARM core */
#[cfg(feature = "rpi1")]
pub const PERIPHERAL_BASE: usize = 0x2000_0000;
#[cfg(not(feature = "rpi1"))]
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

/* Alias used when handing ARM physical addresses to the VideoCore */
#[cfg(feature = "rpi1")]
pub const VC_BUS_ALIAS: u32 = 0x4000_0000;
#[cfg(not(feature = "rpi1"))]
pub const VC_BUS_ALIAS: u32 = 0xC000_0000;

/* Activity LED wiring */
#[cfg(feature = "rpi1")]
pub const ACT_LED_PIN: u32 = 16;
#[cfg(feature = "rpi1")]
pub const ACT_LED_ACTIVE_LOW: bool = true;
#[cfg(not(feature = "rpi1"))]
pub const ACT_LED_PIN: u32 = 47;
#[cfg(not(feature = "rpi1"))]
pub const ACT_LED_ACTIVE_LOW: bool = false;

/* Core/VPU clock feeding the mini UART baud generator */
pub const SYS_CLOCK_HZ: u32 = 250_000_000;

pub const GPIO_BASE: usize = PERIPHERAL_BASE + 0x20_0000;
pub const AUX_BASE: usize = PERIPHERAL_BASE + 0x21_5000;
pub const INTC_BASE: usize = PERIPHERAL_BASE + 0xB200;
pub const ARM_TIMER_BASE: usize = PERIPHERAL_BASE + 0xB400;
pub const MAILBOX_BASE: usize = PERIPHERAL_BASE + 0xB880;
