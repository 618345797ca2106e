use core::{
    cell::{Cell, UnsafeCell},
    marker::PhantomData,
};

use super::irq::{CriticalSection, IrqControl};

/// Interrupt-safe mutex for single-core targets.
///
/// - Masks interrupts on lock
/// - Restores the previous interrupt state on drop
/// - Panics on re-entrant locking instead of spinning forever
///
/// With interrupts masked an ISR can never observe the lock taken by
/// foreground code, so the only way to find it locked is re-entrance from
/// the holder itself (for example a callback invoked while the guard lives).
///
/// Not fair. Not reentrant. Not for multi-core sharing.
pub struct IrqMutex<T, I: IrqControl> {
    locked: Cell<bool>,
    data: UnsafeCell<T>,
    _irq: PhantomData<I>,
}

// SAFETY: access to `data` is serialised by masking interrupts on a single
// core and by the `locked` flag.
unsafe impl<T: Send, I: IrqControl> Send for IrqMutex<T, I> {}
unsafe impl<T: Send, I: IrqControl> Sync for IrqMutex<T, I> {}

impl<T, I: IrqControl> IrqMutex<T, I> {
    /// Create a new interrupt-safe mutex.
    pub const fn new(data: T) -> Self {
        Self {
            locked: Cell::new(false),
            data: UnsafeCell::new(data),
            _irq: PhantomData,
        }
    }

    /// Acquire the lock with interrupts masked.
    pub fn lock(&self) -> IrqMutexGuard<'_, T, I> {
        let cs = CriticalSection::enter();

        if self.locked.replace(true) {
            already_locked();
        }

        IrqMutexGuard { lock: self, _cs: cs }
    }

    /// Run `f` with exclusive access to the protected value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

impl<T: Copy, I: IrqControl> IrqMutex<T, I> {
    /// Copy the protected value out.
    pub fn get(&self) -> T {
        *self.lock()
    }
}

#[inline(never)]
#[cold]
fn already_locked() -> ! {
    panic!("IrqMutex locked re-entrantly")
}

/// Guard returned by `IrqMutex::lock`.
///
/// Releases the lock, then restores the interrupt state, on drop.
pub struct IrqMutexGuard<'a, T, I: IrqControl> {
    lock: &'a IrqMutex<T, I>,
    // Declared last so it is dropped after `Drop::drop` releases the flag.
    _cs: CriticalSection<I>,
}

impl<T, I: IrqControl> core::ops::Deref for IrqMutexGuard<'_, T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, I: IrqControl> core::ops::DerefMut for IrqMutexGuard<'_, T, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T, I: IrqControl> Drop for IrqMutexGuard<'_, T, I> {
    fn drop(&mut self) {
        self.lock.locked.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::CsIrq;

    #[test]
    fn with_mutates_in_place() {
        let m: IrqMutex<[u8; 4], CsIrq> = IrqMutex::new([0; 4]);
        m.with(|slots| slots[2] = 9);
        assert_eq!(m.get(), [0, 0, 9, 0]);
    }

    #[test]
    fn relock_after_release() {
        let m: IrqMutex<u32, CsIrq> = IrqMutex::new(1);
        *m.lock() += 1;
        *m.lock() += 1;
        assert_eq!(m.get(), 3);
    }

    #[test]
    #[should_panic(expected = "re-entrantly")]
    fn reentrant_lock_panics() {
        let m: IrqMutex<u32, CsIrq> = IrqMutex::new(0);
        let _outer = m.lock();
        let _inner = m.lock();
    }
}
