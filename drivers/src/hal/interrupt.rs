//! Interrupt Controller Hardware Abstraction Layer.
//!
//! This module defines platform-independent traits for interrupt management.

/// Interrupt number type.
pub type IrqNumber = u32;

/// Interrupt service routine entry point, as stored in a vector table.
pub type Vector = extern "C" fn();

/// Which interrupt line of a timer a vector belongs to.
///
/// Advanced timers (TIM1, TIM8) split capture/compare and update events
/// onto separate lines; general-purpose timers share one line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerIrq {
    /// Capture/compare events (encoder alarms).
    CaptureCompare,
    /// Update (overflow) events (triggered timeout).
    Update,
}

/// Interrupt controller trait.
///
/// This trait represents the system's interrupt controller (NVIC-style).
pub trait InterruptController {
    /// Error type for interrupt controller operations.
    type Error: core::fmt::Debug;

    /// Point the vector table entry for `irq` at `vector`.
    fn install_vector(&self, irq: IrqNumber, vector: Vector) -> Result<(), Self::Error>;

    /// Enable (unmask) an interrupt line.
    fn enable(&self, irq: IrqNumber) -> Result<(), Self::Error>;

    /// Disable (mask) an interrupt line.
    fn disable(&self, irq: IrqNumber) -> Result<(), Self::Error>;

    /// Check whether an interrupt line is currently unmasked.
    fn is_enabled(&self, irq: IrqNumber) -> bool;
}
