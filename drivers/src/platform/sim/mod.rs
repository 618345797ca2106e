//! Simulated platform.
//!
//! Host-side stand-in for a microcontroller: timers are [`SimTimer`]
//! behavioural models, the interrupt controller records installed vectors
//! and enabled lines, and the board has its own pin tables.
//!
//! Interrupts are delivered synchronously: every stimulus (`input_edge`,
//! `set_level`, `advance_us`) ends by servicing each timer whose
//! interrupt line is live and which has an enabled event pending. Each
//! platform owns its dispatch table, so independent tests never share
//! state.

mod timer;

pub use timer::SimTimer;

use core::cell::Cell;

use super::Platform;
use crate::dispatch::{DispatchTable, IrqEvent};
use crate::hal::clock::{Bus, BusDivider, ClockTree};
use crate::hal::gpio::{GpioController, Pin, PullMode};
use crate::hal::interrupt::{InterruptController, IrqNumber, TimerIrq, Vector};
use crate::hal::pinmap::{PinFunction, PinMap, PinMapEntry};
use crate::hal::timer::{Channel, Edge, TimerId, TimerRegisters};
use crate::resolver::PinRoute;
use common::sync::CsIrq;

/// Simulated board pins and their timer capabilities.
pub mod pins {
    use crate::hal::gpio::{Pin, Port};
    use crate::hal::pinmap::{PinMapEntry, function_data::pack};
    use crate::hal::timer::TimerId;

    pub const PA0: Pin = Pin::new(Port::A, 0);
    pub const PA1: Pin = Pin::new(Port::A, 1);
    pub const PA2: Pin = Pin::new(Port::A, 2);
    pub const PA6: Pin = Pin::new(Port::A, 6);
    pub const PA8: Pin = Pin::new(Port::A, 8);
    pub const PA15: Pin = Pin::new(Port::A, 15);
    pub const PB4: Pin = Pin::new(Port::B, 4);
    pub const PB5: Pin = Pin::new(Port::B, 5);
    pub const PB6: Pin = Pin::new(Port::B, 6);
    pub const PB7: Pin = Pin::new(Port::B, 7);
    pub const PC6: Pin = Pin::new(Port::C, 6);
    pub const PD2: Pin = Pin::new(Port::D, 2);
    pub const PD12: Pin = Pin::new(Port::D, 12);
    pub const PE9: Pin = Pin::new(Port::E, 9);
    pub const PE11: Pin = Pin::new(Port::E, 11);
    pub const PH10: Pin = Pin::new(Port::H, 10);
    pub const PH11: Pin = Pin::new(Port::H, 11);

    pub static COUNTER: [PinMapEntry; 6] = [
        PinMapEntry::new(PA0, TimerId::Tim2, pack(1, 1, false)),
        PinMapEntry::new(PA1, TimerId::Tim2, pack(1, 2, true)),
        PinMapEntry::new(PA6, TimerId::Tim3, pack(2, 1, false)),
        PinMapEntry::new(PC6, TimerId::Tim8, pack(3, 1, false)),
        PinMapEntry::new(PA2, TimerId::Tim5, pack(2, 3, false)),
        // Channel field out of range.
        PinMapEntry::new(PD2, TimerId::Tim3, pack(2, 9, false)),
    ];

    pub static TRIGGER: [PinMapEntry; 5] = [
        PinMapEntry::new(PA15, TimerId::Tim2, pack(1, 1, false)),
        PinMapEntry::new(PA8, TimerId::Tim1, pack(1, 1, false)),
        PinMapEntry::new(PD12, TimerId::Tim4, pack(2, 1, false)),
        PinMapEntry::new(PH10, TimerId::Tim5, pack(2, 1, false)),
        PinMapEntry::new(PH11, TimerId::Tim5, pack(2, 2, true)),
    ];

    pub static ENCODER_A: [PinMapEntry; 3] = [
        PinMapEntry::new(PE9, TimerId::Tim1, pack(1, 1, false)),
        PinMapEntry::new(PB4, TimerId::Tim3, pack(2, 1, false)),
        PinMapEntry::new(PB6, TimerId::Tim4, pack(2, 1, false)),
    ];

    pub static ENCODER_B: [PinMapEntry; 3] = [
        PinMapEntry::new(PE11, TimerId::Tim1, pack(1, 2, false)),
        PinMapEntry::new(PB5, TimerId::Tim3, pack(2, 2, false)),
        PinMapEntry::new(PB7, TimerId::Tim4, pack(2, 2, false)),
    ];
}

/// Number of simulated interrupt lines.
const IRQ_LINES: usize = 2 * TimerId::COUNT;

/// Pins the simulated GPIO block can route at once.
const MAX_ROUTED: usize = 16;

const HZ_PER_MHZ: u64 = 1_000_000;

/// Simulated interrupt controller errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimIrqError {
    InvalidIrq(IrqNumber),
    /// Line marked unavailable with [`SimPlatform::refuse_irq`].
    Refused(IrqNumber),
}

/// Simulated GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimGpioError {
    InvalidPin,
    TooManyPins,
}

#[derive(Debug, Copy, Clone)]
struct BusClock {
    hz: u32,
    divider: BusDivider,
}

pub struct SimPlatform {
    timers: [SimTimer; TimerId::COUNT],
    dispatch: DispatchTable<CsIrq>,
    apb1: BusClock,
    apb2: BusClock,
    clocks_enabled: Cell<u32>,
    routed: [Cell<Option<(Pin, u8)>>; MAX_ROUTED],
    vectors: [Cell<Option<Vector>>; IRQ_LINES],
    irq_enabled: Cell<u32>,
    irq_refused: Cell<u32>,
}

impl SimPlatform {
    /// Board with a 168 MHz AHB, APB1 at 42 MHz and APB2 at 84 MHz.
    pub fn new() -> Self {
        Self {
            timers: TimerId::ALL.map(SimTimer::new),
            dispatch: DispatchTable::new(),
            apb1: BusClock {
                hz: 42_000_000,
                divider: BusDivider::Div4,
            },
            apb2: BusClock {
                hz: 84_000_000,
                divider: BusDivider::Div2,
            },
            clocks_enabled: Cell::new(0),
            routed: core::array::from_fn(|_| Cell::new(None)),
            vectors: core::array::from_fn(|_| Cell::new(None)),
            irq_enabled: Cell::new(0),
            irq_refused: Cell::new(0),
        }
    }

    /// Override the clock of one bus.
    pub fn with_bus_clock(mut self, bus: Bus, hz: u32, divider: BusDivider) -> Self {
        let clock = BusClock { hz, divider };
        match bus {
            Bus::Apb1 => self.apb1 = clock,
            Bus::Apb2 => self.apb2 = clock,
        }
        self
    }

    /// Make `install_vector` fail for `irq`.
    pub fn refuse_irq(&self, irq: IrqNumber) {
        self.irq_refused.set(self.irq_refused.get() | 1 << irq);
    }

    pub fn is_clock_enabled(&self, id: TimerId) -> bool {
        self.clocks_enabled.get() & 1 << id.index() != 0
    }

    /// Alternate function `pin` is routed to, if any.
    pub fn routed_af(&self, pin: Pin) -> Option<u8> {
        self.routed
            .iter()
            .filter_map(Cell::get)
            .find(|(routed, _)| *routed == pin)
            .map(|(_, af)| af)
    }

    pub fn vector(&self, irq: IrqNumber) -> Option<Vector> {
        self.vectors.get(irq as usize).and_then(Cell::get)
    }

    // ------------------------------------------------------------------------
    // Stimuli
    // ------------------------------------------------------------------------

    /// Drive an edge onto `pin`. Ignored unless the pin is routed to the
    /// timer input its table entry names.
    pub fn input_edge(&self, pin: Pin, edge: Edge) {
        for function in [PinFunction::Counter, PinFunction::Trigger] {
            let Some(entry) = self.lookup(pin, function) else {
                continue;
            };
            let Ok(route) = PinRoute::decode(pin, entry.data) else {
                continue;
            };
            if self.routed_af(pin) == Some(route.af) {
                self.timers[entry.timer.index()].input_edge(route.channel, edge);
            }
        }
        self.pump();
    }

    /// `count` full pulses (rising then falling edge) on `pin`.
    pub fn pulses(&self, pin: Pin, count: u32) {
        for _ in 0..count {
            self.input_edge(pin, Edge::Rising);
            self.input_edge(pin, Edge::Falling);
        }
    }

    /// Timer input an encoder pin is routed to.
    fn encoder_input(&self, pin: Pin) -> Option<(&SimTimer, Channel)> {
        for function in [PinFunction::EncoderA, PinFunction::EncoderB] {
            let Some(entry) = self.lookup(pin, function) else {
                continue;
            };
            let Ok(route) = PinRoute::decode(pin, entry.data) else {
                continue;
            };
            if self.routed_af(pin) == Some(route.af) {
                return Some((&self.timers[entry.timer.index()], route.channel));
            }
        }
        None
    }

    /// Drive encoder pin `pin` high or low. Ignored unless the pin is
    /// routed to its timer.
    pub fn set_level(&self, pin: Pin, high: bool) {
        if let Some((timer, channel)) = self.encoder_input(pin) {
            timer.set_input_level(channel, high);
        }
        self.pump();
    }

    /// Level of encoder pin `pin`; low while unrouted.
    pub fn level(&self, pin: Pin) -> bool {
        self.encoder_input(pin)
            .is_some_and(|(timer, channel)| timer.input_level(channel))
    }

    /// `transitions` Gray-code transitions on a quadrature pair.
    ///
    /// Forward: phase A leads, 00 -> 10 -> 11 -> 01 -> 00.
    /// Backward: phase B leads, 00 -> 01 -> 11 -> 10 -> 00.
    pub fn quadrature(&self, pin_a: Pin, pin_b: Pin, forward: bool, transitions: u32) {
        for _ in 0..transitions {
            let (a, b) = (self.level(pin_a), self.level(pin_b));
            if (a == b) == forward {
                self.set_level(pin_a, !a);
            } else {
                self.set_level(pin_b, !b);
            }
        }
    }

    /// Let `us` microseconds of kernel clock elapse on every timer.
    pub fn advance_us(&self, us: u32) {
        for _ in 0..us {
            for timer in &self.timers {
                let hz = self.timer_clock(timer.id().bus());
                timer.run_cycles(u64::from(hz) / HZ_PER_MHZ);
            }
            self.pump();
        }
    }

    fn line_live(&self, id: TimerId, line: TimerIrq) -> bool {
        let irq = self.timer_irq(id, line);
        self.is_enabled(irq) && self.vector(irq).is_some()
    }

    /// Service every timer with a live line and an enabled event pending.
    fn pump(&self) {
        for timer in &self.timers {
            let id = timer.id();
            let pending = |event: IrqEvent| {
                timer.status().contains(event.flag()) && timer.interrupts().contains(event.enable())
            };
            let compare = self.line_live(id, TimerIrq::CaptureCompare)
                && (pending(IrqEvent::Alarm1) || pending(IrqEvent::Alarm2));
            let update = self.line_live(id, TimerIrq::Update) && pending(IrqEvent::Overflow);
            if compare || update {
                self.dispatch.service(id, timer);
            }
        }
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

extern "C" fn sim_vector() {}

impl PinMap for SimPlatform {
    fn table(&self, function: PinFunction) -> &[PinMapEntry] {
        match function {
            PinFunction::Counter => &pins::COUNTER,
            PinFunction::Trigger => &pins::TRIGGER,
            PinFunction::EncoderA => &pins::ENCODER_A,
            PinFunction::EncoderB => &pins::ENCODER_B,
        }
    }
}

impl GpioController for SimPlatform {
    type Error = SimGpioError;

    fn set_alternate_function(&self, pin: Pin, af: u8, _pull: PullMode) -> Result<(), Self::Error> {
        if pin.number() > 15 {
            return Err(SimGpioError::InvalidPin);
        }
        let slot = self
            .routed
            .iter()
            .find(|slot| slot.get().is_none_or(|(routed, _)| routed == pin))
            .ok_or(SimGpioError::TooManyPins)?;
        slot.set(Some((pin, af)));
        Ok(())
    }
}

impl ClockTree for SimPlatform {
    fn bus_frequency(&self, bus: Bus) -> u32 {
        match bus {
            Bus::Apb1 => self.apb1.hz,
            Bus::Apb2 => self.apb2.hz,
        }
    }

    fn bus_divider(&self, bus: Bus) -> BusDivider {
        match bus {
            Bus::Apb1 => self.apb1.divider,
            Bus::Apb2 => self.apb2.divider,
        }
    }
}

fn check(irq: IrqNumber) -> Result<(), SimIrqError> {
    if (irq as usize) < IRQ_LINES {
        Ok(())
    } else {
        Err(SimIrqError::InvalidIrq(irq))
    }
}

impl InterruptController for SimPlatform {
    type Error = SimIrqError;

    fn install_vector(&self, irq: IrqNumber, vector: Vector) -> Result<(), Self::Error> {
        check(irq)?;
        if self.irq_refused.get() & 1 << irq != 0 {
            return Err(SimIrqError::Refused(irq));
        }
        self.vectors[irq as usize].set(Some(vector));
        Ok(())
    }

    fn enable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        check(irq)?;
        self.irq_enabled.set(self.irq_enabled.get() | 1 << irq);
        Ok(())
    }

    fn disable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        check(irq)?;
        self.irq_enabled.set(self.irq_enabled.get() & !(1 << irq));
        Ok(())
    }

    fn is_enabled(&self, irq: IrqNumber) -> bool {
        check(irq).is_ok() && self.irq_enabled.get() & 1 << irq != 0
    }
}

impl Platform for SimPlatform {
    type Irq = CsIrq;
    type Timer = SimTimer;

    fn name(&self) -> &'static str {
        "sim"
    }

    fn timer(&self, id: TimerId) -> &Self::Timer {
        &self.timers[id.index()]
    }

    fn enable_timer_clock(&self, id: TimerId) {
        self.clocks_enabled.set(self.clocks_enabled.get() | 1 << id.index());
    }

    fn dispatch(&self) -> &DispatchTable<Self::Irq> {
        &self.dispatch
    }

    /// Advanced timers (TIM1, TIM8) have separate compare and update lines;
    /// the others share one.
    fn timer_irq(&self, id: TimerId, line: TimerIrq) -> IrqNumber {
        let base = 2 * id.index() as IrqNumber;
        match (id, line) {
            (TimerId::Tim1 | TimerId::Tim8, TimerIrq::Update) => base + 1,
            _ => base,
        }
    }

    fn timer_vector(&self, _id: TimerId, _line: TimerIrq) -> Vector {
        sim_vector
    }
}
