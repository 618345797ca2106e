use core::fmt::Debug;
use core::marker::PhantomData;

/// Architecture-specific interrupt masking interface.
///
/// Implemented by the architecture layer ([`crate::arch`]) or by
/// [`CsIrq`], which defers to whatever `critical-section` implementation the
/// final binary links.
pub trait IrqControl {
    /// Saved interrupt state
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    fn restore(state: Self::State);
}

/// Interrupt masking through the `critical-section` crate.
///
/// On a single-core Cortex-M target the implementation is provided by
/// `common::arch::arm` (feature `cortex-m`); host tests link the `std`
/// implementation.
#[derive(Debug, Clone, Copy)]
pub struct CsIrq;

impl IrqControl for CsIrq {
    type State = critical_section::RestoreState;

    #[inline]
    fn disable() -> Self::State {
        // SAFETY: every acquire is paired with exactly one release by
        // `CriticalSection::drop`, in reverse nesting order.
        unsafe { critical_section::acquire() }
    }

    #[inline]
    fn restore(state: Self::State) {
        // SAFETY: `state` comes from the matching `disable` call.
        unsafe { critical_section::release(state) }
    }
}

/// Scoped critical section.
///
/// Interrupts are masked for the lifetime of the guard and the previous
/// state is restored when it is dropped, on every exit path.
///
/// Nesting is allowed; guards must be dropped in reverse order of creation,
/// which normal scoping guarantees.
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct CriticalSection<I: IrqControl> {
    state: I::State,
    // Restoring on another core would corrupt its interrupt state.
    _not_send: PhantomData<*const ()>,
}

impl<I: IrqControl> CriticalSection<I> {
    /// Mask interrupts until the returned guard is dropped.
    #[inline]
    pub fn enter() -> Self {
        Self {
            state: I::disable(),
            _not_send: PhantomData,
        }
    }

    /// Run `f` with interrupts masked.
    #[inline]
    pub fn with<R>(f: impl FnOnce() -> R) -> R {
        let _cs = Self::enter();
        f()
    }
}

impl<I: IrqControl> Drop for CriticalSection<I> {
    #[inline]
    fn drop(&mut self) {
        I::restore(self.state);
    }
}
