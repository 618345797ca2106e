//! STM32F4 GPIO alternate-function routing.

use super::rcc;
use crate::hal::gpio::{GpioController, Pin, PullMode};
use core::ptr::{read_volatile, write_volatile};

/// GPIOA base address; ports follow every 0x400 bytes.
pub const GPIO_BASE: usize = 0x4002_0000;

const MODER: usize = 0x00;
const PUPDR: usize = 0x0C;
const AFRL: usize = 0x20;

/// MODER value selecting alternate function.
const MODE_AF: u32 = 0b10;

#[inline(always)]
fn reg(pin: Pin, offset: usize) -> *mut u32 {
    (GPIO_BASE + pin.port().index() * 0x400 + offset) as *mut u32
}

fn write_field(ptr: *mut u32, shift: u32, width: u32, value: u32) {
    let mask = ((1 << width) - 1) << shift;
    unsafe {
        let current = read_volatile(ptr);
        write_volatile(ptr, (current & !mask) | (value << shift & mask));
    }
}

/// GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    InvalidPin,
    InvalidFunction,
}

// ============================================================================
// Raw Hardware Functions
// ============================================================================

/// Route a pin to alternate function `af`.
pub fn set_alternate_function(pin: Pin, af: u8, pull: PullMode) -> Result<(), GpioError> {
    let n = u32::from(pin.number());
    if n > 15 {
        return Err(GpioError::InvalidPin);
    }
    if af > 15 {
        return Err(GpioError::InvalidFunction);
    }

    rcc::enable_port(pin.port());

    let afr = reg(pin, AFRL + (n as usize / 8) * 4);
    write_field(afr, (n % 8) * 4, 4, u32::from(af));

    let pupd = match pull {
        PullMode::None => 0b00,
        PullMode::Up => 0b01,
        PullMode::Down => 0b10,
    };
    write_field(reg(pin, PUPDR), n * 2, 2, pupd);
    write_field(reg(pin, MODER), n * 2, 2, MODE_AF);
    Ok(())
}

// ============================================================================
// HAL Implementation
// ============================================================================

/// GPIO ports A-I.
#[derive(Debug)]
pub struct Stm32f4Gpio;

impl GpioController for Stm32f4Gpio {
    type Error = GpioError;

    fn set_alternate_function(&self, pin: Pin, af: u8, pull: PullMode) -> Result<(), Self::Error> {
        set_alternate_function(pin, af, pull)
    }
}
