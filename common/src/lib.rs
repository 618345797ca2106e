//! Interrupt-masking primitives shared by the timer drivers.
//!
//! - [`sync`]: the [`IrqControl`](sync::IrqControl) abstraction, scoped
//!   critical sections and an interrupt-safe mutex.
//! - [`arch`]: architecture back ends for interrupt masking.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod arch;
pub mod sync;
