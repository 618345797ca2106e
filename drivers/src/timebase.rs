//! Timebase programmer.
//!
//! Turns a requested duration into prescaler and auto-reload values for a
//! timer whose kernel clock is known.

use crate::error::{ConfigError, Result};
use crate::hal::timer::ClockDivision;

/// Candidate tick lengths in microseconds, finest first.
pub const TICK_UNITS_US: [u32; 2] = [1, 500];

/// Largest value the prescaler register holds.
pub const PRESCALER_MAX: u32 = 0xFFFF;

const HZ_PER_MHZ: u32 = 1_000_000;

/// Prescaler and period register values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timebase {
    /// PSC value; the counter ticks every `prescaler + 1` kernel clocks.
    pub prescaler: u32,
    /// ARR value; an update event fires after `period + 1` ticks.
    pub period: u32,
    pub clock_division: ClockDivision,
    /// Length of one tick in microseconds, `0` when the counter is clocked
    /// by external events.
    pub tick_us: u32,
}

impl Timebase {
    /// Undivided full-range counting, used by the counter and the encoder.
    pub const fn free_running(counter_max: u32) -> Self {
        Self {
            prescaler: 0,
            period: counter_max,
            clock_division: ClockDivision::Div1,
            tick_us: 0,
        }
    }

    /// Timebase whose update event fires `us` microseconds after the counter
    /// starts.
    ///
    /// Picks the finest tick unit whose period fits `counter_max`.
    pub fn for_interval(us: u32, timer_clock_hz: u32, counter_max: u32) -> Result<Self> {
        if us == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if timer_clock_hz < HZ_PER_MHZ {
            return Err(ConfigError::ClockTooSlow { hz: timer_clock_hz });
        }

        let mut period = 0;
        let mut tick_us = 0;
        for unit in TICK_UNITS_US {
            period = (us - 1) / unit;
            tick_us = unit;
            if period <= counter_max {
                break;
            }
        }
        if period > counter_max {
            return Err(ConfigError::PeriodOutOfRange {
                period,
                max: counter_max,
            });
        }

        let ticks_per_unit = u64::from(timer_clock_hz / HZ_PER_MHZ) * u64::from(tick_us);
        let prescaler = ticks_per_unit - 1;
        if prescaler > u64::from(PRESCALER_MAX) {
            return Err(ConfigError::PrescalerOutOfRange {
                prescaler: u32::try_from(prescaler).unwrap_or(u32::MAX),
            });
        }

        let timebase = Self {
            prescaler: prescaler as u32,
            period,
            clock_division: ClockDivision::Div1,
            tick_us,
        };
        log::debug!(
            "timebase {us} us: psc={} arr={} tick={} us",
            timebase.prescaler,
            timebase.period,
            timebase.tick_us
        );
        Ok(timebase)
    }

    /// Duration covered by one full period, in microseconds.
    pub fn interval_us(&self) -> u64 {
        u64::from(self.tick_us) * (u64::from(self.period) + 1)
    }
}

/// Milliseconds to microseconds.
pub fn millis_to_micros(ms: u32) -> Result<u32> {
    ms.checked_mul(1_000).ok_or(ConfigError::IntervalOverflow)
}

/// Seconds to whole microseconds, truncating.
pub fn secs_to_micros(secs: f32) -> Result<u32> {
    let us = secs * 1_000_000.0;
    if !us.is_finite() || us >= 4_294_967_296.0 {
        return Err(ConfigError::IntervalOverflow);
    }
    if us < 1.0 {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(us as u32)
}
