/*
 * Utility Library
 *
 * Unrecoverable-error paths shared by the trap vectors and the panic
 * handler.
 */

#![cfg_attr(not(test), no_std)]

pub mod panic;
