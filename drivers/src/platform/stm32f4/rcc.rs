//! STM32F4 Reset and Clock Control
//!
//! Peripheral clock gating and APB prescaler queries.

use crate::hal::clock::{Bus, BusDivider};
use crate::hal::gpio::Port;
use crate::hal::timer::TimerId;
use core::ptr::{read_volatile, write_volatile};

/// RCC base address.
pub const RCC_BASE: usize = 0x4002_3800;

const CFGR: usize = 0x08;
const AHB1ENR: usize = 0x30;
const APB1ENR: usize = 0x40;
const APB2ENR: usize = 0x44;

const PPRE1_SHIFT: u32 = 10;
const PPRE2_SHIFT: u32 = 13;

#[inline(always)]
fn reg(offset: usize) -> *mut u32 {
    (RCC_BASE + offset) as *mut u32
}

fn set_bits(offset: usize, bits: u32) {
    unsafe {
        let value = read_volatile(reg(offset));
        write_volatile(reg(offset), value | bits);
        // Delay after enabling a peripheral clock
        let _ = read_volatile(reg(offset));
    }
}

// ============================================================================
// Raw Hardware Functions
// ============================================================================

/// Gate the clock of a timer on.
pub fn enable_timer(id: TimerId) {
    let (offset, bit) = match id {
        TimerId::Tim2 => (APB1ENR, 0),
        TimerId::Tim3 => (APB1ENR, 1),
        TimerId::Tim4 => (APB1ENR, 2),
        TimerId::Tim5 => (APB1ENR, 3),
        TimerId::Tim1 => (APB2ENR, 0),
        TimerId::Tim8 => (APB2ENR, 1),
    };
    set_bits(offset, 1 << bit);
}

/// Gate the clock of a GPIO port on.
pub fn enable_port(port: Port) {
    set_bits(AHB1ENR, 1 << port.index());
}

/// Current APB prescaler.
pub fn bus_divider(bus: Bus) -> BusDivider {
    let shift = match bus {
        Bus::Apb1 => PPRE1_SHIFT,
        Bus::Apb2 => PPRE2_SHIFT,
    };
    let ppre = unsafe { read_volatile(reg(CFGR)) } >> shift & 0b111;
    match ppre {
        0b100 => BusDivider::Div2,
        0b101 => BusDivider::Div4,
        0b110 => BusDivider::Div8,
        0b111 => BusDivider::Div16,
        _ => BusDivider::Div1,
    }
}
