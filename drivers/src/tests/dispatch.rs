use common::sync::CsIrq;

use super::{record, take_fired};
use crate::dispatch::{DispatchTable, IrqEvent};
use crate::hal::timer::{Cr1, Dier, Egr, Register, Status, TimerId, TimerRegisters};
use crate::platform::sim::SimTimer;

/// Run the counter from zero up to `count` so compare flags at or below it
/// are raised.
fn count_to(timer: &SimTimer, count: u32) {
    timer.write(Register::Arr, 0xFFFF);
    timer.set_bits(Register::Cr1, Cr1::CEN.bits());
    timer.run_cycles(u64::from(count));
    timer.clear_bits(Register::Cr1, Cr1::CEN.bits());
}

fn table() -> DispatchTable<CsIrq> {
    DispatchTable::new()
}

#[test]
fn pending_events_are_serviced_in_order() {
    let timer = SimTimer::new(TimerId::Tim3);
    let table = table();
    table.register(TimerId::Tim3, 1);
    for event in IrqEvent::ORDER {
        table.set_handler(TimerId::Tim3, event, Some(record));
    }

    timer.write(Register::Ccr3, 5);
    timer.write(Register::Ccr4, 5);
    count_to(&timer, 5);
    timer.write(Register::Egr, Egr::UG.bits());
    timer.write(Register::Dier, (Dier::UIE | Dier::CC3IE | Dier::CC4IE).bits());

    assert_eq!(table.service(TimerId::Tim3, &timer), 3);
    assert_eq!(
        take_fired(),
        [(1, IrqEvent::Alarm1), (1, IrqEvent::Alarm2), (1, IrqEvent::Overflow)]
    );
    assert!(!timer.status().intersects(Status::UIF | Status::CC3IF | Status::CC4IF));
}

#[test]
fn disabled_events_stay_pending() {
    let timer = SimTimer::new(TimerId::Tim4);
    let table = table();
    table.register(TimerId::Tim4, 1);
    table.set_handler(TimerId::Tim4, IrqEvent::Overflow, Some(record));

    timer.write(Register::Egr, Egr::UG.bits());
    timer.write(Register::Dier, Dier::CC3IE.bits());

    assert_eq!(table.service(TimerId::Tim4, &timer), 0);
    assert!(take_fired().is_empty());
    assert!(timer.status().contains(Status::UIF));
}

#[test]
fn empty_handler_slot_still_acknowledges() {
    let timer = SimTimer::new(TimerId::Tim4);
    let table = table();
    table.register(TimerId::Tim4, 1);

    timer.write(Register::Egr, Egr::UG.bits());
    timer.write(Register::Dier, Dier::UIE.bits());

    assert_eq!(table.service(TimerId::Tim4, &timer), 1);
    assert!(take_fired().is_empty());
    assert!(!timer.status().contains(Status::UIF));
}

#[test]
fn unregistered_timer_still_acknowledges() {
    let timer = SimTimer::new(TimerId::Tim2);
    let table = table();

    timer.write(Register::Egr, Egr::UG.bits());
    timer.write(Register::Dier, Dier::UIE.bits());

    assert_eq!(table.service(TimerId::Tim2, &timer), 1);
    assert!(!timer.status().contains(Status::UIF));
}

#[test]
fn last_registration_wins() {
    let table = table();
    table.register(TimerId::Tim1, 1);
    table.set_handler(TimerId::Tim1, IrqEvent::Alarm1, Some(record));

    table.register(TimerId::Tim1, 2);
    let entry = table.entry(TimerId::Tim1).unwrap();
    assert_eq!(entry.handle, 2);
    assert!(entry.handler(IrqEvent::Alarm1).is_none());

    table.set_handler(TimerId::Tim1, IrqEvent::Alarm2, Some(record));
    table.register(TimerId::Tim1, 2);
    assert!(table.entry(TimerId::Tim1).unwrap().handler(IrqEvent::Alarm2).is_some());
}

#[test]
fn only_the_owner_releases_a_slot() {
    let table = table();
    table.register(TimerId::Tim8, 7);

    table.release(TimerId::Tim8, 8);
    assert_eq!(table.entry(TimerId::Tim8).map(|e| e.handle), Some(7));

    table.release(TimerId::Tim8, 7);
    assert!(table.entry(TimerId::Tim8).is_none());
}

#[test]
fn handler_on_unregistered_slot_is_ignored() {
    let table = table();
    table.set_handler(TimerId::Tim5, IrqEvent::Overflow, Some(record));
    assert!(table.entry(TimerId::Tim5).is_none());
}

#[test]
fn slots_are_independent() {
    let table = table();
    table.register(TimerId::Tim2, 2);
    table.register(TimerId::Tim3, 3);
    table.set_handler(TimerId::Tim3, IrqEvent::Overflow, Some(record));

    assert!(table.entry(TimerId::Tim2).unwrap().handler(IrqEvent::Overflow).is_none());
    assert_eq!(table.entry(TimerId::Tim3).map(|e| e.handle), Some(3));
}

static REENTRANT: DispatchTable<CsIrq> = DispatchTable::new();

fn release_self(handle: usize, event: IrqEvent) {
    REENTRANT.release(TimerId::Tim5, handle);
    record(handle, event);
}

#[test]
fn handlers_run_with_the_table_unlocked() {
    let timer = SimTimer::new(TimerId::Tim5);
    REENTRANT.register(TimerId::Tim5, 9);
    REENTRANT.set_handler(TimerId::Tim5, IrqEvent::Overflow, Some(release_self));

    timer.write(Register::Egr, Egr::UG.bits());
    timer.write(Register::Dier, Dier::UIE.bits());

    assert_eq!(REENTRANT.service(TimerId::Tim5, &timer), 1);
    assert_eq!(take_fired(), [(9, IrqEvent::Overflow)]);
    assert!(REENTRANT.entry(TimerId::Tim5).is_none());
}
