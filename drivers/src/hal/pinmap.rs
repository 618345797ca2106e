//! Static pin-capability tables.
//!
//! Each pin function has a table of `{pin, timer, data}` entries. The
//! `data` word packs the alternate-function number, the timer channel and an
//! "inverted" flag, see [`function_data`].

use super::gpio::Pin;
use super::timer::TimerId;

/// Role a pin plays for a timer device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinFunction {
    /// External clock input of a free-running counter.
    Counter,
    /// Encoder phase A (must land on channel 1).
    EncoderA,
    /// Encoder phase B (must land on channel 2).
    EncoderB,
    /// Slave trigger input of a triggered timeout.
    Trigger,
}

/// One row of a pin-capability table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinMapEntry {
    pub pin: Pin,
    pub timer: TimerId,
    pub data: u32,
}

impl PinMapEntry {
    pub const fn new(pin: Pin, timer: TimerId, data: u32) -> Self {
        Self { pin, timer, data }
    }
}

/// Function data layout.
///
/// ```text
/// bits 0..=3  alternate function number
/// bits 4..=8  timer channel (1..=4)
/// bit  9      signal inverted on the board
/// ```
pub mod function_data {
    pub const AF_MASK: u32 = 0xF;
    pub const CHANNEL_SHIFT: u32 = 4;
    pub const CHANNEL_MASK: u32 = 0x1F << CHANNEL_SHIFT;
    pub const INVERTED: u32 = 1 << 9;
    /// Every bit with a meaning; anything outside is malformed.
    pub const VALID_MASK: u32 = AF_MASK | CHANNEL_MASK | INVERTED;

    pub const fn pack(af: u8, channel: u8, inverted: bool) -> u32 {
        (af as u32 & AF_MASK)
            | ((channel as u32) << CHANNEL_SHIFT) & CHANNEL_MASK
            | if inverted { INVERTED } else { 0 }
    }
}

/// Pin-capability lookup.
pub trait PinMap {
    /// Table for one pin function.
    fn table(&self, function: PinFunction) -> &[PinMapEntry];

    /// Find the entry for `pin` in the `function` table.
    fn lookup(&self, pin: Pin, function: PinFunction) -> Option<PinMapEntry> {
        self.table(function).iter().find(|e| e.pin == pin).copied()
    }
}
