//! Timer Hardware Abstraction Layer.
//!
//! This module describes the general-purpose timer block the devices are
//! built on: its identities, channels, register map and bit fields, plus the
//! [`TimerRegisters`] trait that gives register-level access to one
//! instance.
//!
//! The register contract follows the STM32 general-purpose/advanced timers
//! (TIM1–TIM5, TIM8): slave mode controller, encoder interface, four
//! capture/compare channels and an update (overflow) event.

use bitflags::bitflags;

use super::clock::Bus;

/// Physical timer instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TimerId {
    Tim1,
    Tim2,
    Tim3,
    Tim4,
    Tim5,
    Tim8,
}

impl TimerId {
    /// Number of timer instances the framework recognises.
    pub const COUNT: usize = 6;

    /// Every recognised instance, in index order.
    pub const ALL: [TimerId; Self::COUNT] = [
        TimerId::Tim1,
        TimerId::Tim2,
        TimerId::Tim3,
        TimerId::Tim4,
        TimerId::Tim5,
        TimerId::Tim8,
    ];

    /// Dense index used by per-timer tables.
    pub const fn index(self) -> usize {
        match self {
            TimerId::Tim1 => 0,
            TimerId::Tim2 => 1,
            TimerId::Tim3 => 2,
            TimerId::Tim4 => 3,
            TimerId::Tim5 => 4,
            TimerId::Tim8 => 5,
        }
    }

    /// Timer number as printed in reference manuals (`TIMx`).
    pub const fn number(self) -> u8 {
        match self {
            TimerId::Tim1 => 1,
            TimerId::Tim2 => 2,
            TimerId::Tim3 => 3,
            TimerId::Tim4 => 4,
            TimerId::Tim5 => 5,
            TimerId::Tim8 => 8,
        }
    }

    /// Peripheral bus clocking this timer.
    pub const fn bus(self) -> Bus {
        match self {
            TimerId::Tim1 | TimerId::Tim8 => Bus::Apb2,
            _ => Bus::Apb1,
        }
    }

    /// Whether the counter, auto-reload and compare registers are 32 bits
    /// wide.
    pub const fn is_32bit(self) -> bool {
        matches!(self, TimerId::Tim2 | TimerId::Tim5)
    }
}

/// Capture/compare channel of a timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    Ch1 = 1,
    Ch2 = 2,
    Ch3 = 3,
    Ch4 = 4,
}

impl Channel {
    /// Decode a 1-based channel number.
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Channel::Ch1),
            2 => Some(Channel::Ch2),
            3 => Some(Channel::Ch3),
            4 => Some(Channel::Ch4),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        self as u8
    }

    /// CCMRx register and bit offset of this channel's 8-bit field.
    pub const fn ccmr(self) -> (Register, u32) {
        match self {
            Channel::Ch1 => (Register::Ccmr1, 0),
            Channel::Ch2 => (Register::Ccmr1, 8),
            Channel::Ch3 => (Register::Ccmr2, 0),
            Channel::Ch4 => (Register::Ccmr2, 8),
        }
    }

    /// Capture/compare value register.
    pub const fn ccr(self) -> Register {
        match self {
            Channel::Ch1 => Register::Ccr1,
            Channel::Ch2 => Register::Ccr2,
            Channel::Ch3 => Register::Ccr3,
            Channel::Ch4 => Register::Ccr4,
        }
    }

    /// CCER enable bit.
    pub const fn enable(self) -> Ccer {
        match self {
            Channel::Ch1 => Ccer::CC1E,
            Channel::Ch2 => Ccer::CC2E,
            Channel::Ch3 => Ccer::CC3E,
            Channel::Ch4 => Ccer::CC4E,
        }
    }

    /// CCER polarity bits (CCxP | CCxNP).
    pub const fn polarity_mask(self) -> Ccer {
        match self {
            Channel::Ch1 => Ccer::CC1P.union(Ccer::CC1NP),
            Channel::Ch2 => Ccer::CC2P.union(Ccer::CC2NP),
            Channel::Ch3 => Ccer::CC3P.union(Ccer::CC3NP),
            Channel::Ch4 => Ccer::CC4P.union(Ccer::CC4NP),
        }
    }

    /// CCER bit selecting falling-edge polarity.
    pub const fn falling(self) -> Ccer {
        match self {
            Channel::Ch1 => Ccer::CC1P,
            Channel::Ch2 => Ccer::CC2P,
            Channel::Ch3 => Ccer::CC3P,
            Channel::Ch4 => Ccer::CC4P,
        }
    }

    /// DIER interrupt enable bit.
    pub const fn interrupt(self) -> Dier {
        match self {
            Channel::Ch1 => Dier::CC1IE,
            Channel::Ch2 => Dier::CC2IE,
            Channel::Ch3 => Dier::CC3IE,
            Channel::Ch4 => Dier::CC4IE,
        }
    }

    /// SR capture/compare flag.
    pub const fn flag(self) -> Status {
        match self {
            Channel::Ch1 => Status::CC1IF,
            Channel::Ch2 => Status::CC2IF,
            Channel::Ch3 => Status::CC3IF,
            Channel::Ch4 => Status::CC4IF,
        }
    }
}

/// Active edge of an input signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Edge {
    /// Low-to-high transition.
    #[default]
    Rising,
    /// High-to-low transition.
    Falling,
}

impl Edge {
    /// The opposite edge.
    pub const fn inverted(self) -> Self {
        match self {
            Edge::Rising => Edge::Falling,
            Edge::Falling => Edge::Rising,
        }
    }
}

/// Timer register map (byte offsets from the instance base address).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum Register {
    Cr1 = 0x00,
    Cr2 = 0x04,
    Smcr = 0x08,
    Dier = 0x0C,
    Sr = 0x10,
    Egr = 0x14,
    Ccmr1 = 0x18,
    Ccmr2 = 0x1C,
    Ccer = 0x20,
    Cnt = 0x24,
    Psc = 0x28,
    Arr = 0x2C,
    Ccr1 = 0x34,
    Ccr2 = 0x38,
    Ccr3 = 0x3C,
    Ccr4 = 0x40,
}

impl Register {
    /// Number of 32-bit words spanned by the register map.
    pub const WORDS: usize = 0x44 / 4;

    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Word index into the register block.
    pub const fn word(self) -> usize {
        self as usize / 4
    }
}

bitflags! {
    /// Control register 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr1: u32 {
        /// Counter enable.
        const CEN = 1 << 0;
        /// Update disable.
        const UDIS = 1 << 1;
        /// Update request source.
        const URS = 1 << 2;
        /// One-pulse mode.
        const OPM = 1 << 3;
        /// Direction (set = down-counting).
        const DIR = 1 << 4;
        /// Auto-reload preload enable.
        const ARPE = 1 << 7;
        /// Clock division field.
        const CKD = 0b11 << 8;
    }

    /// DMA/interrupt enable register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dier: u32 {
        const UIE = 1 << 0;
        const CC1IE = 1 << 1;
        const CC2IE = 1 << 2;
        const CC3IE = 1 << 3;
        const CC4IE = 1 << 4;
        const TIE = 1 << 6;
    }

    /// Status register. Flags are cleared by writing 0 (rc_w0).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        const UIF = 1 << 0;
        const CC1IF = 1 << 1;
        const CC2IF = 1 << 2;
        const CC3IF = 1 << 3;
        const CC4IF = 1 << 4;
        const TIF = 1 << 6;
    }

    /// Event generation register (write-only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Egr: u32 {
        /// Update generation: reload prescaler, reset counter.
        const UG = 1 << 0;
        /// Trigger generation.
        const TG = 1 << 6;
    }

    /// Capture/compare enable register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ccer: u32 {
        const CC1E = 1 << 0;
        const CC1P = 1 << 1;
        const CC1NP = 1 << 3;
        const CC2E = 1 << 4;
        const CC2P = 1 << 5;
        const CC2NP = 1 << 7;
        const CC3E = 1 << 8;
        const CC3P = 1 << 9;
        const CC3NP = 1 << 11;
        const CC4E = 1 << 12;
        const CC4P = 1 << 13;
        const CC4NP = 1 << 15;
    }
}

/// Clock division between the timer kernel clock and the digital filters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ClockDivision {
    #[default]
    Div1,
    Div2,
    Div4,
}

impl ClockDivision {
    /// CR1.CKD field value, already shifted into place.
    pub const fn bits(self) -> u32 {
        match self {
            ClockDivision::Div1 => 0b00 << 8,
            ClockDivision::Div2 => 0b01 << 8,
            ClockDivision::Div4 => 0b10 << 8,
        }
    }
}

/// SMCR.SMS slave mode selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum SlaveMode {
    Disabled = 0b000,
    /// Counts TI2FP2 edges depending on TI1FP1 level.
    Encoder1 = 0b001,
    /// Counts TI1FP1 edges depending on TI2FP2 level.
    Encoder2 = 0b010,
    /// Counts on both TI1FP1 and TI2FP2 edges.
    Encoder3 = 0b011,
    Reset = 0b100,
    Gated = 0b101,
    /// Counter starts on a rising edge of TRGI.
    Trigger = 0b110,
    /// Rising edges of TRGI clock the counter.
    ExternalClock1 = 0b111,
}

impl SlaveMode {
    pub const MASK: u32 = 0b111;

    pub const fn from_bits(bits: u32) -> Self {
        match bits & Self::MASK {
            0b001 => SlaveMode::Encoder1,
            0b010 => SlaveMode::Encoder2,
            0b011 => SlaveMode::Encoder3,
            0b100 => SlaveMode::Reset,
            0b101 => SlaveMode::Gated,
            0b110 => SlaveMode::Trigger,
            0b111 => SlaveMode::ExternalClock1,
            _ => SlaveMode::Disabled,
        }
    }

    pub const fn is_encoder(self) -> bool {
        matches!(
            self,
            SlaveMode::Encoder1 | SlaveMode::Encoder2 | SlaveMode::Encoder3
        )
    }
}

/// SMCR.TS trigger selection (only the timer-input sources are used).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum TriggerInput {
    /// Filtered timer input 1.
    Ti1Fp1 = 0b101,
    /// Filtered timer input 2.
    Ti2Fp2 = 0b110,
}

impl TriggerInput {
    pub const SHIFT: u32 = 4;
    pub const MASK: u32 = 0b111 << Self::SHIFT;

    /// Trigger input fed by `channel`, if that channel can drive TRGI.
    pub const fn for_channel(channel: Channel) -> Option<Self> {
        match channel {
            Channel::Ch1 => Some(TriggerInput::Ti1Fp1),
            Channel::Ch2 => Some(TriggerInput::Ti2Fp2),
            _ => None,
        }
    }

    pub const fn from_bits(smcr: u32) -> Option<Self> {
        match (smcr & Self::MASK) >> Self::SHIFT {
            0b101 => Some(TriggerInput::Ti1Fp1),
            0b110 => Some(TriggerInput::Ti2Fp2),
            _ => None,
        }
    }

    pub const fn channel(self) -> Channel {
        match self {
            TriggerInput::Ti1Fp1 => Channel::Ch1,
            TriggerInput::Ti2Fp2 => Channel::Ch2,
        }
    }
}

/// SMCR master/slave mode bit.
pub const SMCR_MSM: u32 = 1 << 7;

/// CR2.MMS master mode field; `0` selects "reset" as TRGO source.
pub const CR2_MMS_MASK: u32 = 0b111 << 4;

/// CCMRx field for one channel configured as input.
pub mod ccmr_input {
    /// CCxS = 01: ICx mapped on TIx.
    pub const DIRECT_TI: u32 = 0b01;
    pub const FILTER_SHIFT: u32 = 4;
}

/// CCMRx field for one channel configured as output compare.
pub mod ccmr_output {
    pub const MODE_SHIFT: u32 = 4;
    /// OCxM = 001: set active on match.
    pub const ACTIVE_ON_MATCH: u32 = 0b001;
}

/// Register-level access to one timer instance.
///
/// Implementations use interior mutability: memory-mapped registers on
/// hardware, cells in the simulator.
pub trait TimerRegisters {
    /// Read a register.
    fn read(&self, reg: Register) -> u32;

    /// Write a register.
    fn write(&self, reg: Register, value: u32);

    /// Largest value the counter can hold (`0xFFFF` or `0xFFFF_FFFF`).
    fn counter_max(&self) -> u32;

    /// Read-modify-write a register.
    fn modify(&self, reg: Register, f: impl FnOnce(u32) -> u32) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Replace the `mask` bits of a register with `value`.
    fn write_field(&self, reg: Register, mask: u32, value: u32) {
        self.modify(reg, |v| (v & !mask) | (value & mask));
    }

    /// Set bits in a read/write register.
    fn set_bits(&self, reg: Register, bits: u32) {
        self.modify(reg, |v| v | bits);
    }

    /// Clear bits in a read/write register.
    fn clear_bits(&self, reg: Register, bits: u32) {
        self.modify(reg, |v| v & !bits);
    }

    /// Clear status flags. SR bits are rc_w0, so untouched flags are
    /// written as 1.
    fn clear_flags(&self, flags: Status) {
        self.write(Register::Sr, !flags.bits());
    }

    /// Current status flags.
    fn status(&self) -> Status {
        Status::from_bits_retain(self.read(Register::Sr))
    }

    /// Current interrupt enables.
    fn interrupts(&self) -> Dier {
        Dier::from_bits_retain(self.read(Register::Dier))
    }

    /// Whether the counter enable bit is set.
    fn is_counting(&self) -> bool {
        Cr1::from_bits_retain(self.read(Register::Cr1)).contains(Cr1::CEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_indices_are_dense() {
        for (i, id) in TimerId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn channel_fields_do_not_overlap() {
        let mut seen = 0u32;
        for ch in [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4] {
            let bits = (ch.enable() | ch.polarity_mask()).bits();
            assert_eq!(seen & bits, 0, "{ch:?}");
            seen |= bits;
        }
    }

    #[test]
    fn only_first_two_channels_drive_trigger() {
        assert_eq!(
            TriggerInput::for_channel(Channel::Ch1),
            Some(TriggerInput::Ti1Fp1)
        );
        assert_eq!(
            TriggerInput::for_channel(Channel::Ch2),
            Some(TriggerInput::Ti2Fp2)
        );
        assert_eq!(TriggerInput::for_channel(Channel::Ch3), None);
        assert_eq!(TriggerInput::for_channel(Channel::Ch4), None);
    }

    #[test]
    fn slave_mode_round_trips_through_smcr() {
        let smcr = SlaveMode::Trigger as u32 | (TriggerInput::Ti2Fp2 as u32) << TriggerInput::SHIFT;
        assert_eq!(SlaveMode::from_bits(smcr), SlaveMode::Trigger);
        assert_eq!(TriggerInput::from_bits(smcr), Some(TriggerInput::Ti2Fp2));
    }
}
