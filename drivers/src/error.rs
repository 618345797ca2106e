//! Configuration errors.
//!
//! Every error in this crate describes a wiring or build-time mistake:
//! a pin without the requested capability, a duration the timer cannot
//! represent, an interrupt line the controller refuses. None of them can be
//! recovered from at runtime, so the device constructors and operations
//! hand them to [`fatal`].

use thiserror::Error;

use crate::hal::gpio::Pin;
use crate::hal::interrupt::IrqNumber;
use crate::hal::pinmap::PinFunction;
use crate::hal::timer::TimerId;

pub type Result<T> = core::result::Result<T, ConfigError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pin {pin} has no {function:?} capability")]
    PinNotFound { pin: Pin, function: PinFunction },

    #[error("malformed function data {data:#06x} for pin {pin}")]
    InvalidFunction { pin: Pin, data: u32 },

    #[error("channel {channel} of {timer:?} cannot be used as {function:?}")]
    UnsupportedChannel {
        timer: TimerId,
        channel: u8,
        function: PinFunction,
    },

    #[error("encoder pins resolve to different timers ({a:?} and {b:?})")]
    TimerMismatch { a: TimerId, b: TimerId },

    #[error("failed to route pin {pin} to its timer")]
    PinSetup { pin: Pin },

    #[error("position {position} is outside the range of {timer:?}")]
    PositionOutOfRange { position: i32, timer: TimerId },

    #[error("interval must be non-zero")]
    ZeroInterval,

    #[error("timer clock of {hz} Hz is below 1 MHz")]
    ClockTooSlow { hz: u32 },

    #[error("prescaler {prescaler} exceeds 16 bits")]
    PrescalerOutOfRange { prescaler: u32 },

    #[error("period {period} exceeds counter maximum {max:#x}")]
    PeriodOutOfRange { period: u32, max: u32 },

    #[error("interval overflows the microsecond range")]
    IntervalOverflow,

    #[error("interrupt line {irq} unavailable")]
    IrqUnavailable { irq: IrqNumber },
}

/// Report a configuration error and never return.
///
/// The error is logged first so it reaches the log sink even when the panic
/// handler only halts.
#[cold]
#[track_caller]
pub fn fatal(err: &ConfigError) -> ! {
    log::error!("timer configuration failed: {err}");
    panic!("timer configuration failed: {err}")
}

/// Unwrap a configuration result, aborting on error.
#[track_caller]
pub(crate) fn or_fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(&err),
    }
}
