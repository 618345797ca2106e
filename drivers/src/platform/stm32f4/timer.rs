//! STM32F4 general-purpose and advanced timer register blocks.

use crate::hal::timer::{Register, TimerId, TimerRegisters};
use core::ptr::{read_volatile, write_volatile};

/// Register block base address of each timer.
pub const fn base_address(id: TimerId) -> usize {
    match id {
        TimerId::Tim1 => 0x4001_0000,
        TimerId::Tim2 => 0x4000_0000,
        TimerId::Tim3 => 0x4000_0400,
        TimerId::Tim4 => 0x4000_0800,
        TimerId::Tim5 => 0x4000_0C00,
        TimerId::Tim8 => 0x4001_0400,
    }
}

/// Memory-mapped timer instance.
#[derive(Debug)]
pub struct Stm32f4Timer {
    id: TimerId,
    base: usize,
}

impl Stm32f4Timer {
    /// # Safety
    ///
    /// The timer's register block must be mapped at its reset address and
    /// only accessed through this instance.
    pub const unsafe fn new(id: TimerId) -> Self {
        Self {
            id,
            base: base_address(id),
        }
    }

    pub const fn id(&self) -> TimerId {
        self.id
    }

    #[inline(always)]
    fn reg(&self, reg: Register) -> *mut u32 {
        (self.base + reg.offset()) as *mut u32
    }
}

impl TimerRegisters for Stm32f4Timer {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        unsafe { read_volatile(self.reg(reg)) }
    }

    #[inline]
    fn write(&self, reg: Register, value: u32) {
        unsafe { write_volatile(self.reg(reg), value) }
    }

    fn counter_max(&self) -> u32 {
        if self.id.is_32bit() { u32::MAX } else { 0xFFFF }
    }
}
