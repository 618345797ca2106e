//! Triggered timeout.
//!
//! The timer sits idle in slave trigger mode until an active edge on the
//! bound input starts it; after the programmed period the update event
//! raises [`IrqEvent::Overflow`]. In [`TimeoutMode::OneShot`] the counter
//! then stops and waits for the next trigger; in
//! [`TimeoutMode::Periodic`] it keeps firing every period.
//!
//! # Example
//!
//! ```rust,ignore
//! fn expired(handle: usize, _event: IrqEvent) { /* ... */ }
//!
//! let mut timeout = TriggeredTimeout::new(&PLATFORM, pins::PA0, Edge::Falling, 0);
//! timeout.attach(Some(expired));
//! timeout.set_period_ms(20);
//! ```

use common::sync::CriticalSection;

use crate::dispatch::{IrqEvent, IrqHandler};
use crate::error::{Result, or_fatal};
use crate::hal::clock::ClockTree;
use crate::hal::gpio::Pin;
use crate::hal::interrupt::TimerIrq;
use crate::hal::pinmap::PinFunction;
use crate::hal::timer::{Cr1, Dier, Edge, Register, TimerRegisters};
use crate::mode;
use crate::platform::{Platform, TimerVector};
use crate::resolver::{self, PeripheralBinding};
use crate::timebase::{self, Timebase};

/// What the counter does once the period elapses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeoutMode {
    /// Stop and wait for the next trigger.
    #[default]
    OneShot,
    /// Restart from zero and fire again every period.
    Periodic,
}

pub struct TriggeredTimeout<'p, P: Platform> {
    platform: &'p P,
    binding: PeripheralBinding,
    handle: usize,
    mode: TimeoutMode,
    timebase: Option<Timebase>,
    vector: TimerVector,
}

impl<'p, P: Platform> TriggeredTimeout<'p, P> {
    /// Time out after `edge` transitions on `pin`. The handler registered
    /// with [`attach`](Self::attach) receives `handle`. No period is loaded
    /// until one of the `set_period_*` calls.
    pub fn new(platform: &'p P, pin: Pin, edge: Edge, handle: usize) -> Self {
        or_fatal(Self::try_new(platform, pin, edge, handle))
    }

    pub fn try_new(platform: &'p P, pin: Pin, edge: Edge, handle: usize) -> Result<Self> {
        let binding = resolver::resolve(platform, pin, PinFunction::Trigger, edge)?;
        let trigger = binding.trigger_input()?;

        platform.enable_timer_clock(binding.timer);
        binding.route(platform)?;

        let regs = platform.timer(binding.timer);
        CriticalSection::<P::Irq>::with(|| {
            mode::configure_triggered(regs, &binding, trigger);
            regs.set_bits(Register::Cr1, Cr1::OPM.bits());
            platform.dispatch().register(binding.timer, handle);
        });

        Ok(Self {
            platform,
            binding,
            handle,
            mode: TimeoutMode::default(),
            timebase: None,
            vector: TimerVector::new(binding.timer, TimerIrq::Update),
        })
    }

    pub fn binding(&self) -> &PeripheralBinding {
        &self.binding
    }

    fn regs(&self) -> &'p P::Timer {
        self.platform.timer(self.binding.timer)
    }

    /// Install `handler` for the timeout event. `None` leaves the timeout
    /// armed with no callback.
    pub fn attach(&mut self, handler: Option<IrqHandler>) {
        self.platform
            .dispatch()
            .set_handler(self.binding.timer, IrqEvent::Overflow, handler);
    }

    /// Load a new period.
    ///
    /// Runs as one interrupt-atomic transaction: the update interrupt is
    /// masked, the counter stopped, the timebase reprogrammed and any stale
    /// update flag cleared before the interrupt is unmasked again. A timer
    /// that was running restarts with the new period. The update vector is
    /// installed on first use and unmasked even after `disable_irq`.
    pub fn set_period_us(&mut self, us: u32) {
        or_fatal(self.try_set_period_us(us))
    }

    pub fn set_period_ms(&mut self, ms: u32) {
        or_fatal(timebase::millis_to_micros(ms).and_then(|us| self.try_set_period_us(us)))
    }

    /// Period in seconds, truncated to whole microseconds.
    pub fn set_period_secs(&mut self, secs: f32) {
        or_fatal(timebase::secs_to_micros(secs).and_then(|us| self.try_set_period_us(us)))
    }

    pub fn try_set_period_us(&mut self, us: u32) -> Result<()> {
        let regs = self.regs();
        let clock = self.platform.timer_clock(self.binding.timer.bus());
        let tb = Timebase::for_interval(us, clock, regs.counter_max())?;

        {
            let _cs = CriticalSection::<P::Irq>::enter();
            regs.clear_bits(Register::Dier, Dier::UIE.bits());
            mode::reprogram_timeout(regs, &tb, self.mode == TimeoutMode::OneShot);
            regs.set_bits(Register::Dier, Dier::UIE.bits());
        }
        self.timebase = Some(tb);

        self.vector.enable(self.platform)
    }

    /// Currently loaded period in microseconds.
    pub fn period_us(&self) -> Option<u64> {
        self.timebase.as_ref().map(Timebase::interval_us)
    }

    pub fn mode(&self) -> TimeoutMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TimeoutMode) {
        self.mode = mode;
        let regs = self.regs();
        let _cs = CriticalSection::<P::Irq>::enter();
        match mode {
            TimeoutMode::OneShot => regs.set_bits(Register::Cr1, Cr1::OPM.bits()),
            TimeoutMode::Periodic => regs.clear_bits(Register::Cr1, Cr1::OPM.bits()),
        }
    }

    /// Start timing now, as if the trigger edge had arrived.
    pub fn start(&mut self) {
        let _cs = CriticalSection::<P::Irq>::enter();
        self.regs().set_bits(Register::Cr1, Cr1::CEN.bits());
    }

    /// Stop timing. The next trigger edge starts the counter again from
    /// where it stopped.
    pub fn stop(&mut self) {
        let _cs = CriticalSection::<P::Irq>::enter();
        self.regs().clear_bits(Register::Cr1, Cr1::CEN.bits());
    }

    pub fn reset(&mut self) {
        self.regs().write(Register::Cnt, 0);
    }

    /// Ticks elapsed since the trigger.
    pub fn read(&self) -> u32 {
        self.regs().read(Register::Cnt)
    }

    pub fn is_running(&self) -> bool {
        self.regs().is_counting()
    }

    /// Unmask the update vector, installing it on first use.
    pub fn enable_irq(&mut self) {
        or_fatal(self.vector.enable(self.platform))
    }

    /// Mask the update vector. The period and handler are kept.
    pub fn disable_irq(&mut self) {
        self.vector.disable(self.platform)
    }
}

impl<P: Platform> Drop for TriggeredTimeout<'_, P> {
    fn drop(&mut self) {
        let regs = self.regs();
        let _cs = CriticalSection::<P::Irq>::enter();
        regs.clear_bits(Register::Dier, Dier::UIE.bits());
        regs.clear_bits(Register::Cr1, Cr1::CEN.bits());
        self.platform
            .dispatch()
            .release(self.binding.timer, self.handle);
    }
}
