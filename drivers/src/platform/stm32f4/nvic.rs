//! Cortex-M NVIC and vector table access.

use crate::hal::interrupt::{InterruptController, IrqNumber, Vector};
use core::ptr::{read_volatile, write_volatile};

const NVIC_ISER: usize = 0xE000_E100;
const NVIC_ICER: usize = 0xE000_E180;
const SCB_VTOR: usize = 0xE000_ED08;

/// Exception entries preceding IRQ 0 in the vector table.
const EXCEPTION_ENTRIES: usize = 16;

/// Number of external interrupt lines on STM32F4.
pub const IRQ_COUNT: u32 = 82;

fn bank(irq: IrqNumber) -> (usize, u32) {
    ((irq / 32) as usize * 4, 1 << (irq % 32))
}

// ============================================================================
// Raw Hardware Functions
// ============================================================================

/// Enable an interrupt line.
pub fn enable_irq(irq: IrqNumber) {
    let (offset, bit) = bank(irq);
    unsafe { write_volatile((NVIC_ISER + offset) as *mut u32, bit) }
}

/// Disable an interrupt line.
pub fn disable_irq(irq: IrqNumber) {
    let (offset, bit) = bank(irq);
    unsafe { write_volatile((NVIC_ICER + offset) as *mut u32, bit) }
}

/// Check whether an interrupt line is enabled.
pub fn is_enabled(irq: IrqNumber) -> bool {
    let (offset, bit) = bank(irq);
    unsafe { read_volatile((NVIC_ISER + offset) as *const u32) & bit != 0 }
}

/// Point a vector table entry at `vector`.
///
/// # Safety
///
/// VTOR must point at a vector table in RAM.
pub unsafe fn set_vector(irq: IrqNumber, vector: Vector) {
    unsafe {
        let table = read_volatile(SCB_VTOR as *const u32) as usize as *mut u32;
        let entry = table.add(EXCEPTION_ENTRIES + irq as usize);
        write_volatile(entry, vector as usize as u32);
    }
}

// ============================================================================
// HAL Implementation
// ============================================================================

/// Nested vectored interrupt controller.
#[derive(Debug)]
pub struct Nvic;

/// Interrupt controller errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NvicError {
    /// IRQ number past the last line of the device.
    InvalidIrq(IrqNumber),
}

fn check(irq: IrqNumber) -> Result<(), NvicError> {
    if irq < IRQ_COUNT {
        Ok(())
    } else {
        Err(NvicError::InvalidIrq(irq))
    }
}

impl InterruptController for Nvic {
    type Error = NvicError;

    fn install_vector(&self, irq: IrqNumber, vector: Vector) -> Result<(), Self::Error> {
        check(irq)?;
        // SAFETY: the platform relocates its vector table to RAM at boot.
        unsafe { set_vector(irq, vector) };
        Ok(())
    }

    fn enable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        check(irq)?;
        enable_irq(irq);
        Ok(())
    }

    fn disable(&self, irq: IrqNumber) -> Result<(), Self::Error> {
        check(irq)?;
        disable_irq(irq);
        Ok(())
    }

    fn is_enabled(&self, irq: IrqNumber) -> bool {
        irq < IRQ_COUNT && is_enabled(irq)
    }
}
