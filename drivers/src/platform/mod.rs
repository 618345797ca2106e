//! Platform Abstraction Layer
//!
//! A platform bundles every collaborator the timer devices consume: the
//! pin-capability tables, GPIO routing, the clock tree, the interrupt
//! controller, the timer register blocks and the dispatch table their
//! vectors service.
//!
//! # Usage
//!
//! ```rust,ignore
//! use timer_inputs::platform::CurrentPlatform;
//! use timer_inputs::peripheral::Counter;
//!
//! static PLATFORM: CurrentPlatform = CurrentPlatform::new(168_000_000);
//!
//! let mut counter = Counter::new(&PLATFORM, pins::PA0, Edge::Rising);
//! counter.start();
//! ```

use common::sync::IrqControl;

use crate::dispatch::DispatchTable;
use crate::error::{ConfigError, Result};
use crate::hal::clock::ClockTree;
use crate::hal::gpio::GpioController;
use crate::hal::interrupt::{InterruptController, IrqNumber, TimerIrq, Vector};
use crate::hal::pinmap::PinMap;
use crate::hal::timer::{TimerId, TimerRegisters};

/// Platform trait - implemented by each supported platform
pub trait Platform: PinMap + GpioController + ClockTree + InterruptController {
    /// Interrupt masking used for critical sections.
    type Irq: IrqControl;

    /// Register block of one timer instance.
    type Timer: TimerRegisters;

    /// Platform name for debugging
    fn name(&self) -> &'static str;

    /// Register block of timer `id`.
    fn timer(&self, id: TimerId) -> &Self::Timer;

    /// Gate the peripheral clock of timer `id` on.
    fn enable_timer_clock(&self, id: TimerId);

    /// Table the timer vectors of this platform service.
    fn dispatch(&self) -> &DispatchTable<Self::Irq>;

    /// Interrupt line carrying `line` events of timer `id`.
    fn timer_irq(&self, id: TimerId, line: TimerIrq) -> IrqNumber;

    /// Vector servicing `line` events of timer `id`.
    fn timer_vector(&self, id: TimerId, line: TimerIrq) -> Vector;
}

/// One timer interrupt line as seen by a device.
///
/// The vector is installed the first time the device arms an event on it.
/// Every later arm unmasks the line again.
#[derive(Debug)]
pub(crate) struct TimerVector {
    id: TimerId,
    line: TimerIrq,
    installed: bool,
}

impl TimerVector {
    pub(crate) const fn new(id: TimerId, line: TimerIrq) -> Self {
        Self {
            id,
            line,
            installed: false,
        }
    }

    /// Unmask the line, installing the vector on first use.
    pub(crate) fn enable<P: Platform + ?Sized>(&mut self, platform: &P) -> Result<()> {
        let irq = platform.timer_irq(self.id, self.line);
        if !self.installed {
            platform
                .install_vector(irq, platform.timer_vector(self.id, self.line))
                .map_err(|_| ConfigError::IrqUnavailable { irq })?;
            self.installed = true;
            log::debug!("{}: {:?} {:?} vector on IRQ {irq}", platform.name(), self.id, self.line);
        }
        if !platform.is_enabled(irq) {
            InterruptController::enable(platform, irq)
                .map_err(|_| ConfigError::IrqUnavailable { irq })?;
        }
        Ok(())
    }

    /// Mask the line. A vector that was never installed is left alone.
    pub(crate) fn disable<P: Platform + ?Sized>(&self, platform: &P) {
        if self.installed {
            let irq = platform.timer_irq(self.id, self.line);
            // The line was accepted at install time, so masking it succeeds.
            let _ = InterruptController::disable(platform, irq);
        }
    }
}

#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(feature = "stm32f4")] {
        pub mod stm32f4;
        pub use stm32f4::Stm32f4Platform as CurrentPlatform;
    } else if #[cfg(feature = "sim")] {
        pub use sim::SimPlatform as CurrentPlatform;
    } else {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features stm32f4\n\
            Or:  cargo build --no-default-features --features sim"
        );
    }
}
