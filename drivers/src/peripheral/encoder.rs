//! Quadrature position encoder.
//!
//! Phase A and B drive the timer's encoder interface on channels 1 and 2;
//! the counter follows the shaft position. Channels 3 and 4 are compare
//! units that raise [`IrqEvent::Alarm1`] and [`IrqEvent::Alarm2`] when the
//! position reaches an armed value.
//!
//! # Example
//!
//! ```rust,ignore
//! fn on_alarm(handle: usize, event: IrqEvent) { /* ... */ }
//!
//! let mut enc = Encoder::new(&PLATFORM, pins::PB4, pins::PB5, 0);
//! enc.arm(Alarm::Alarm1, Some(on_alarm), 400);
//! enc.start();
//! ```

use common::sync::CriticalSection;

use crate::dispatch::{IrqEvent, IrqHandler};
use crate::error::{ConfigError, Result, or_fatal};
use crate::hal::gpio::Pin;
use crate::hal::interrupt::TimerIrq;
use crate::hal::timer::{Channel, Cr1, Register, TimerRegisters};
use crate::mode;
use crate::platform::{Platform, TimerVector};
use crate::resolver::{self, PeripheralBinding};

/// Encoder compare alarm.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Alarm {
    Alarm1,
    Alarm2,
}

impl Alarm {
    pub const fn channel(self) -> Channel {
        match self {
            Alarm::Alarm1 => Channel::Ch3,
            Alarm::Alarm2 => Channel::Ch4,
        }
    }

    pub const fn event(self) -> IrqEvent {
        match self {
            Alarm::Alarm1 => IrqEvent::Alarm1,
            Alarm::Alarm2 => IrqEvent::Alarm2,
        }
    }
}

pub struct Encoder<'p, P: Platform> {
    platform: &'p P,
    binding: PeripheralBinding,
    handle: usize,
    vector: TimerVector,
}

impl<'p, P: Platform> Encoder<'p, P> {
    /// Decode the quadrature pair `pin_a`/`pin_b`. Alarm handlers receive
    /// `handle`. The counter starts stopped at position 0.
    pub fn new(platform: &'p P, pin_a: Pin, pin_b: Pin, handle: usize) -> Self {
        or_fatal(Self::try_new(platform, pin_a, pin_b, handle))
    }

    pub fn try_new(platform: &'p P, pin_a: Pin, pin_b: Pin, handle: usize) -> Result<Self> {
        let binding = resolver::resolve_pair(platform, pin_a, pin_b)?;

        platform.enable_timer_clock(binding.timer);
        binding.route(platform)?;

        let regs = platform.timer(binding.timer);
        CriticalSection::<P::Irq>::with(|| {
            mode::configure_encoder(regs, &binding);
            platform.dispatch().register(binding.timer, handle);
        });

        Ok(Self {
            platform,
            binding,
            handle,
            vector: TimerVector::new(binding.timer, TimerIrq::CaptureCompare),
        })
    }

    pub fn binding(&self) -> &PeripheralBinding {
        &self.binding
    }

    fn regs(&self) -> &'p P::Timer {
        self.platform.timer(self.binding.timer)
    }

    pub fn start(&mut self) {
        let _cs = CriticalSection::<P::Irq>::enter();
        self.regs().set_bits(Register::Cr1, Cr1::CEN.bits());
    }

    pub fn stop(&mut self) {
        let _cs = CriticalSection::<P::Irq>::enter();
        self.regs().clear_bits(Register::Cr1, Cr1::CEN.bits());
    }

    /// Make the current shaft position 0.
    pub fn reset(&mut self) {
        self.regs().write(Register::Cnt, 0);
    }

    /// Signed position. 16-bit counters wrap at ±32768.
    pub fn read(&self) -> i32 {
        let count = self.regs().read(Register::Cnt);
        if self.regs().counter_max() == u32::MAX {
            count as i32
        } else {
            count as u16 as i16 as i32
        }
    }

    pub fn is_running(&self) -> bool {
        self.regs().is_counting()
    }

    /// Counter value at which the encoder reads `position`.
    ///
    /// A 16-bit counter only reaches positions in the `i16` range.
    fn count_for(&self, position: i32) -> Result<u32> {
        let max = self.regs().counter_max();
        if max != u32::MAX && i16::try_from(position).is_err() {
            return Err(ConfigError::PositionOutOfRange {
                position,
                timer: self.binding.timer,
            });
        }
        Ok(position as u32 & max)
    }

    /// Fire `alarm` when the encoder reaches `position`.
    ///
    /// `handler` replaces any handler armed before; `None` arms the compare
    /// unit with no callback. Arming installs the timer's compare vector on
    /// first use and unmasks it. A position the counter cannot reach is a
    /// configuration error.
    pub fn arm(&mut self, alarm: Alarm, handler: Option<IrqHandler>, position: i32) {
        or_fatal(self.try_arm(alarm, handler, position))
    }

    pub fn try_arm(&mut self, alarm: Alarm, handler: Option<IrqHandler>, position: i32) -> Result<()> {
        let regs = self.regs();
        let channel = alarm.channel();
        let count = self.count_for(position)?;
        {
            let _cs = CriticalSection::<P::Irq>::enter();
            regs.clear_bits(Register::Dier, channel.interrupt().bits());
            self.platform
                .dispatch()
                .set_handler(self.binding.timer, alarm.event(), handler);
            regs.write(channel.ccr(), count);
            regs.clear_flags(channel.flag());
            regs.set_bits(Register::Dier, channel.interrupt().bits());
        }
        log::debug!("{:?}: {alarm:?} armed at {position}", self.binding.timer);

        self.vector.enable(self.platform)
    }

    /// Stop `alarm` from firing and drop its handler.
    pub fn disarm(&mut self, alarm: Alarm) {
        let regs = self.regs();
        let channel = alarm.channel();
        let _cs = CriticalSection::<P::Irq>::enter();
        regs.clear_bits(Register::Dier, channel.interrupt().bits());
        regs.clear_flags(channel.flag());
        self.platform
            .dispatch()
            .set_handler(self.binding.timer, alarm.event(), None);
    }

    /// Unmask the compare vector, installing it on first use.
    pub fn enable_irq(&mut self) {
        or_fatal(self.vector.enable(self.platform))
    }

    /// Mask the compare vector. Configuration and armed alarms are kept.
    pub fn disable_irq(&mut self) {
        self.vector.disable(self.platform)
    }
}

impl<P: Platform> Drop for Encoder<'_, P> {
    fn drop(&mut self) {
        let regs = self.regs();
        let _cs = CriticalSection::<P::Irq>::enter();
        for alarm in [Alarm::Alarm1, Alarm::Alarm2] {
            regs.clear_bits(Register::Dier, alarm.channel().interrupt().bits());
        }
        self.platform
            .dispatch()
            .release(self.binding.timer, self.handle);
    }
}
