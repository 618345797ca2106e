//! Free-running edge counter.
//!
//! The bound input clocks the timer directly (external clock mode 1), so
//! the counter register holds the number of active edges seen since the
//! last reset, modulo the counter width. No interrupt is used.

use common::sync::CriticalSection;

use crate::error::{Result, or_fatal};
use crate::hal::gpio::Pin;
use crate::hal::pinmap::PinFunction;
use crate::hal::timer::{Cr1, Edge, Register, TimerRegisters};
use crate::mode;
use crate::platform::Platform;
use crate::resolver::{self, PeripheralBinding};

pub struct Counter<'p, P: Platform> {
    platform: &'p P,
    binding: PeripheralBinding,
}

impl<'p, P: Platform> Counter<'p, P> {
    /// Count `edge` transitions on `pin`. The counter starts stopped.
    pub fn new(platform: &'p P, pin: Pin, edge: Edge) -> Self {
        or_fatal(Self::try_new(platform, pin, edge))
    }

    pub fn try_new(platform: &'p P, pin: Pin, edge: Edge) -> Result<Self> {
        let binding = resolver::resolve(platform, pin, PinFunction::Counter, edge)?;
        let trigger = binding.trigger_input()?;

        platform.enable_timer_clock(binding.timer);
        binding.route(platform)?;

        let regs = platform.timer(binding.timer);
        CriticalSection::<P::Irq>::with(|| mode::configure_counter(regs, &binding, trigger));

        Ok(Self { platform, binding })
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

    /// Zero the count without touching the run state.
    pub fn reset(&mut self) {
        self.regs().write(Register::Cnt, 0);
    }

    /// Edges counted since the last reset.
    pub fn read(&self) -> u32 {
        self.regs().read(Register::Cnt)
    }

    pub fn is_running(&self) -> bool {
        self.regs().is_counting()
    }
}
