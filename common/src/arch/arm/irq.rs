use crate::sync::irq::IrqControl;

const PRIMASK_PM_BIT: u32 = 1 << 0;

pub struct PrimaskIrq;

/// Interrupt control for single-core Cortex-M (ARMv7-M / ARMv7E-M).
///
/// Masks configurable-priority interrupts through PRIMASK.
///
/// # State Management
/// The `State` type is `bool`: whether interrupts were enabled before
/// `disable()` was called.
///
/// # Assembly Details
///
/// - `mrs {0}, PRIMASK`: read the current mask
/// - `cpsid i`: set PRIMASK (mask interrupts)
/// - `cpsie i`: clear PRIMASK (unmask interrupts)
impl IrqControl for PrimaskIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let primask: u32;
        unsafe {
            core::arch::asm!(
                "mrs {0}, PRIMASK",
                "cpsid i",
                out(reg) primask,
                options(nomem, nostack, preserves_flags)
            );
        }
        primask & PRIMASK_PM_BIT == 0 // true if interrupts were enabled
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        if prev_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack, preserves_flags));
            }
        }
    }
}

/// `critical-section` implementation backed by PRIMASK.
///
/// Enabled with the `cortex-m` feature; only valid on single-core parts.
#[cfg(feature = "cortex-m")]
mod single_core {
    use super::PrimaskIrq;
    use crate::sync::irq::IrqControl;

    struct SingleCoreCriticalSection;
    critical_section::set_impl!(SingleCoreCriticalSection);

    unsafe impl critical_section::Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> critical_section::RawRestoreState {
            PrimaskIrq::disable()
        }

        unsafe fn release(was_enabled: critical_section::RawRestoreState) {
            PrimaskIrq::restore(was_enabled)
        }
    }
}
