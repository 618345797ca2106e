//! Timer Input Devices
//!
//! Logical devices built on a platform's timers.
//!
//! # Available Devices
//!
//! - [`counter`]: free-running edge counter
//! - [`encoder`]: quadrature position encoder with two compare alarms
//! - [`triggered_timeout`]: timeout started by an external trigger edge
//!
//! Constructors and operations abort through [`crate::error::fatal`] on a
//! configuration error; the `try_` variants return it instead.

pub mod counter;
pub mod encoder;
pub mod triggered_timeout;

pub use counter::Counter;
pub use encoder::{Alarm, Encoder};
pub use triggered_timeout::{TimeoutMode, TriggeredTimeout};
