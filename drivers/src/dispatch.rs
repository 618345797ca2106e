//! Interrupt dispatch table.
//!
//! A handful of timer interrupt lines are shared by every device. Each
//! line's vector calls [`DispatchTable::service`] with its timer, which
//! looks up the owning device's slot in constant time and calls the
//! handler registered for each pending event.
//!
//! Slots are written only from foreground code, with interrupts masked.
//! Interrupt context copies its slot out and calls handlers with the table
//! unlocked, so a handler may re-arm its own device.

use common::sync::{IrqControl, IrqMutex};

use crate::hal::timer::{Dier, Status, TimerId, TimerRegisters};

/// Event that fired on a timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqEvent {
    /// Compare match on channel 3.
    Alarm1,
    /// Compare match on channel 4.
    Alarm2,
    /// Counter update (overflow or timeout expiry).
    Overflow,
}

impl IrqEvent {
    pub const COUNT: usize = 3;

    /// Order in which pending flags are tested.
    pub const ORDER: [IrqEvent; Self::COUNT] = [IrqEvent::Alarm1, IrqEvent::Alarm2, IrqEvent::Overflow];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// SR flag raised by this event.
    pub const fn flag(self) -> Status {
        match self {
            IrqEvent::Alarm1 => Status::CC3IF,
            IrqEvent::Alarm2 => Status::CC4IF,
            IrqEvent::Overflow => Status::UIF,
        }
    }

    /// DIER bit enabling this event's interrupt.
    pub const fn enable(self) -> Dier {
        match self {
            IrqEvent::Alarm1 => Dier::CC3IE,
            IrqEvent::Alarm2 => Dier::CC4IE,
            IrqEvent::Overflow => Dier::UIE,
        }
    }
}

/// Interrupt callback: receives the owning device's handle and the event.
pub type IrqHandler = fn(usize, IrqEvent);

/// Per-timer slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub handle: usize,
    handlers: [Option<IrqHandler>; IrqEvent::COUNT],
}

impl DispatchEntry {
    pub const fn new(handle: usize) -> Self {
        Self {
            handle,
            handlers: [None; IrqEvent::COUNT],
        }
    }

    pub fn handler(&self, event: IrqEvent) -> Option<IrqHandler> {
        self.handlers[event.index()]
    }
}

pub struct DispatchTable<I: IrqControl> {
    slots: IrqMutex<[Option<DispatchEntry>; TimerId::COUNT], I>,
}

impl<I: IrqControl> DispatchTable<I> {
    pub const fn new() -> Self {
        Self {
            slots: IrqMutex::new([None; TimerId::COUNT]),
        }
    }

    /// Claim `timer`'s slot for the device identified by `handle`.
    ///
    /// Last writer wins: a slot owned by another handle is replaced, with
    /// its handlers. Re-registering the current owner keeps its handlers.
    pub fn register(&self, timer: TimerId, handle: usize) {
        self.slots.with(|slots| {
            let slot = &mut slots[timer.index()];
            match slot.map(|entry| entry.handle) {
                Some(owner) if owner == handle => {}
                Some(owner) => {
                    log::warn!("{timer:?}: dispatch slot of handle {owner:#x} taken over by {handle:#x}");
                    *slot = Some(DispatchEntry::new(handle));
                }
                None => *slot = Some(DispatchEntry::new(handle)),
            }
        });
        log::debug!("{timer:?}: dispatch slot -> handle {handle:#x}");
    }

    /// Install or clear the handler for one event.
    ///
    /// Ignored when nobody has registered `timer`.
    pub fn set_handler(&self, timer: TimerId, event: IrqEvent, handler: Option<IrqHandler>) {
        let installed = self.slots.with(|slots| match &mut slots[timer.index()] {
            Some(entry) => {
                entry.handlers[event.index()] = handler;
                true
            }
            None => false,
        });
        if !installed {
            log::warn!("{timer:?}: {event:?} handler set on an unregistered slot");
        }
    }

    /// Empty `timer`'s slot if `handle` still owns it.
    pub fn release(&self, timer: TimerId, handle: usize) {
        self.slots.with(|slots| {
            let slot = &mut slots[timer.index()];
            if slot.is_some_and(|entry| entry.handle == handle) {
                *slot = None;
            }
        });
    }

    /// Copy of `timer`'s slot.
    pub fn entry(&self, timer: TimerId) -> Option<DispatchEntry> {
        self.slots.with(|slots| slots[timer.index()])
    }

    /// Service one interrupt entry for `timer`.
    ///
    /// Tests channel 3, channel 4 and update flags, in that order. Every
    /// flag that is both pending and enabled is cleared and its handler, if
    /// any, is called. Returns the number of events serviced.
    pub fn service<R: TimerRegisters + ?Sized>(&self, timer: TimerId, regs: &R) -> usize {
        let status = regs.status();
        let enabled = regs.interrupts();
        let entry = self.entry(timer);

        let mut serviced = 0;
        for event in IrqEvent::ORDER {
            if !status.contains(event.flag()) || !enabled.contains(event.enable()) {
                continue;
            }
            regs.clear_flags(event.flag());
            serviced += 1;

            match entry.and_then(|e| e.handler(event).map(|h| (e.handle, h))) {
                Some((handle, handler)) => {
                    log::trace!("{timer:?}: {event:?} -> handle {handle:#x}");
                    handler(handle, event);
                }
                None => log::trace!("{timer:?}: {event:?} with no handler"),
            }
        }
        serviced
    }
}

impl<I: IrqControl> Default for DispatchTable<I> {
    fn default() -> Self {
        Self::new()
    }
}
