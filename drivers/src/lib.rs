//! Timer Input Framework
//!
//! Turns general-purpose hardware timers into three input devices: an
//! edge counter, a quadrature encoder and a triggered timeout.
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`platform`]: Platform-specific drivers (SoC level)
//! - [`peripheral`]: The timer input devices
//! - [`resolver`]: Pin to timer/channel binding
//! - [`timebase`]: Prescaler and period arithmetic
//! - [`mode`]: Register sequences for each device mode
//! - [`dispatch`]: Interrupt vector to device handler routing
//!
//! # Design Principles
//!
//! 1. **Owned configuration**: each device owns its binding and timebase;
//!    no register handle is shared between instances
//! 2. **Constant-time dispatch**: vectors find their handler by timer index
//! 3. **Scoped critical sections**: every multi-register update runs with
//!    interrupts masked and restores them on every exit path
//! 4. **Fail fast**: miswiring aborts at construction, see [`error`]
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use timer_inputs::hal::timer::Edge;
//! use timer_inputs::peripheral::Counter;
//! use timer_inputs::platform::{CurrentPlatform, stm32f4::pins};
//!
//! static PLATFORM: CurrentPlatform = CurrentPlatform::new(168_000_000);
//!
//! let mut counter = Counter::new(&PLATFORM, pins::PA0, Edge::Rising);
//! counter.start();
//! let edges = counter.read();
//! ```

#![no_std]
#![allow(dead_code)]

#[cfg(test)]
extern crate std;

pub mod dispatch;
pub mod error;
pub mod hal;
pub mod mode;
pub mod peripheral;
pub mod platform;
pub mod resolver;
pub mod timebase;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use dispatch::{IrqEvent, IrqHandler};
pub use error::ConfigError;
pub use hal::timer::{Edge, TimerId};
pub use peripheral::{Alarm, Counter, Encoder, TimeoutMode, TriggeredTimeout};
pub use platform::{CurrentPlatform, Platform};
