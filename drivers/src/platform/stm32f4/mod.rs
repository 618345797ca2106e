//! STM32F4 platform.
//!
//! Timers TIM1-TIM5 and TIM8 through their memory-mapped register blocks,
//! the NVIC with a RAM vector table, and the RCC/GPIO blocks needed to
//! bring a timer input up.
//!
//! Interrupt lines:
//!
//! | Timer | Capture/compare | Update |
//! |-------|-----------------|--------|
//! | TIM1  | 27 (TIM1_CC)    | 25 (TIM1_UP_TIM10) |
//! | TIM2  | 28              | 28     |
//! | TIM3  | 29              | 29     |
//! | TIM4  | 30              | 30     |
//! | TIM5  | 50              | 50     |
//! | TIM8  | 46 (TIM8_CC)    | 44 (TIM8_UP_TIM13) |

mod gpio;
mod nvic;
pub mod pins;
mod rcc;
mod timer;

pub use timer::Stm32f4Timer;

use super::Platform;
use crate::dispatch::DispatchTable;
use crate::hal::clock::{Bus, BusDivider, ClockTree};
use crate::hal::gpio::{GpioController, Pin, PullMode};
use crate::hal::interrupt::{InterruptController, IrqNumber, TimerIrq, Vector};
use crate::hal::pinmap::{PinFunction, PinMap, PinMapEntry};
use crate::hal::timer::TimerId;
use common::sync::CsIrq;
use gpio::{GpioError, Stm32f4Gpio};
use nvic::{Nvic, NvicError};

// ============================================================================
// Internal Platform State (not exposed)
// ============================================================================

/// Dispatch table serviced by the timer vectors below.
static DISPATCH: DispatchTable<CsIrq> = DispatchTable::new();

/// Timer register blocks, indexed by `TimerId::index()`.
// SAFETY: each block is mapped at its reset address on every STM32F4 part.
static TIMERS: [Stm32f4Timer; TimerId::COUNT] = unsafe {
    [
        Stm32f4Timer::new(TimerId::Tim1),
        Stm32f4Timer::new(TimerId::Tim2),
        Stm32f4Timer::new(TimerId::Tim3),
        Stm32f4Timer::new(TimerId::Tim4),
        Stm32f4Timer::new(TimerId::Tim5),
        Stm32f4Timer::new(TimerId::Tim8),
    ]
};

fn service(id: TimerId) {
    DISPATCH.service(id, &TIMERS[id.index()]);
}

extern "C" fn tim1_cc_vector() {
    service(TimerId::Tim1);
}

extern "C" fn tim1_up_vector() {
    service(TimerId::Tim1);
}

extern "C" fn tim2_vector() {
    service(TimerId::Tim2);
}

extern "C" fn tim3_vector() {
    service(TimerId::Tim3);
}

extern "C" fn tim4_vector() {
    service(TimerId::Tim4);
}

extern "C" fn tim5_vector() {
    service(TimerId::Tim5);
}

extern "C" fn tim8_cc_vector() {
    service(TimerId::Tim8);
}

extern "C" fn tim8_up_vector() {
    service(TimerId::Tim8);
}

// ============================================================================
// Platform
// ============================================================================

/// STM32F4 platform.
#[derive(Debug)]
pub struct Stm32f4Platform {
    hclk_hz: u32,
    nvic: Nvic,
    gpio: Stm32f4Gpio,
}

impl Stm32f4Platform {
    /// Platform running its AHB at `hclk_hz`.
    pub const fn new(hclk_hz: u32) -> Self {
        Self {
            hclk_hz,
            nvic: Nvic,
            gpio: Stm32f4Gpio,
        }
    }
}

impl PinMap for Stm32f4Platform {
    fn table(&self, function: PinFunction) -> &[PinMapEntry] {
        pins::table(function)
    }
}

impl GpioController for Stm32f4Platform {
    type Error = GpioError;

    fn set_alternate_function(&self, pin: Pin, af: u8, pull: PullMode) -> Result<(), Self::Error> {
        self.gpio.set_alternate_function(pin, af, pull)
    }
}

impl ClockTree for Stm32f4Platform {
    fn bus_frequency(&self, bus: Bus) -> u32 {
        self.hclk_hz / rcc::bus_divider(bus).ratio()
    }

    fn bus_divider(&self, bus: Bus) -> BusDivider {
        rcc::bus_divider(bus)
    }
}

impl InterruptController for Stm32f4Platform {
    type Error = NvicError;

    fn install_vector(&self, irq: IrqNumber, vector: Vector) -> Result<(), Self::Error> {
        self.nvic.install_vector(irq, vector)
    }

    fn enable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        self.nvic.enable(irq)
    }

    fn disable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        self.nvic.disable(irq)
    }

    fn is_enabled(&self, irq: IrqNumber) -> bool {
        self.nvic.is_enabled(irq)
    }
}

impl Platform for Stm32f4Platform {
    type Irq = CsIrq;
    type Timer = Stm32f4Timer;

    fn name(&self) -> &'static str {
        "STM32F4"
    }

    fn timer(&self, id: TimerId) -> &Self::Timer {
        &TIMERS[id.index()]
    }

    fn enable_timer_clock(&self, id: TimerId) {
        rcc::enable_timer(id);
    }

    fn dispatch(&self) -> &DispatchTable<Self::Irq> {
        &DISPATCH
    }

    fn timer_irq(&self, id: TimerId, line: TimerIrq) -> IrqNumber {
        match (id, line) {
            (TimerId::Tim1, TimerIrq::CaptureCompare) => 27,
            (TimerId::Tim1, TimerIrq::Update) => 25,
            (TimerId::Tim2, _) => 28,
            (TimerId::Tim3, _) => 29,
            (TimerId::Tim4, _) => 30,
            (TimerId::Tim5, _) => 50,
            (TimerId::Tim8, TimerIrq::CaptureCompare) => 46,
            (TimerId::Tim8, TimerIrq::Update) => 44,
        }
    }

    fn timer_vector(&self, id: TimerId, line: TimerIrq) -> Vector {
        match (id, line) {
            (TimerId::Tim1, TimerIrq::CaptureCompare) => tim1_cc_vector,
            (TimerId::Tim1, TimerIrq::Update) => tim1_up_vector,
            (TimerId::Tim2, _) => tim2_vector,
            (TimerId::Tim3, _) => tim3_vector,
            (TimerId::Tim4, _) => tim4_vector,
            (TimerId::Tim5, _) => tim5_vector,
            (TimerId::Tim8, TimerIrq::CaptureCompare) => tim8_cc_vector,
            (TimerId::Tim8, TimerIrq::Update) => tim8_up_vector,
        }
    }
}
