use std::vec;

use super::{record, take_fired};
use crate::dispatch::IrqEvent;
use crate::error::ConfigError;
use crate::hal::interrupt::{InterruptController, TimerIrq};
use crate::hal::timer::{Edge, Register, SlaveMode, Status, TimerId, TimerRegisters};
use crate::peripheral::{TimeoutMode, TriggeredTimeout};
use crate::platform::Platform;
use crate::platform::sim::{SimPlatform, pins};

const HANDLE: usize = 0x70;

fn armed(platform: &SimPlatform, us: u32) -> TriggeredTimeout<'_, SimPlatform> {
    let mut timeout = TriggeredTimeout::new(platform, pins::PD12, Edge::Rising, HANDLE);
    timeout.attach(Some(record));
    timeout.set_period_us(us);
    timeout
}

#[test]
fn construction_waits_for_a_trigger() {
    let platform = SimPlatform::new();
    let timeout = TriggeredTimeout::new(&platform, pins::PD12, Edge::Rising, HANDLE);

    assert_eq!(timeout.binding().timer, TimerId::Tim4);
    assert_eq!(timeout.mode(), TimeoutMode::OneShot);
    assert_eq!(timeout.period_us(), None);
    assert!(!timeout.is_running());

    let regs = platform.timer(TimerId::Tim4);
    assert_eq!(SlaveMode::from_bits(regs.read(Register::Smcr)), SlaveMode::Trigger);
    assert!(regs.interrupts().is_empty());
}

#[test]
fn fires_once_after_the_trigger() {
    let platform = SimPlatform::new();
    let timeout = armed(&platform, 1_000);
    let irq = platform.timer_irq(TimerId::Tim4, TimerIrq::Update);
    assert!(platform.is_enabled(irq));

    // Nothing happens before the trigger.
    platform.advance_us(2_000);
    assert!(take_fired().is_empty());

    platform.input_edge(pins::PD12, Edge::Rising);
    assert!(timeout.is_running());
    platform.advance_us(999);
    assert!(take_fired().is_empty());

    platform.advance_us(1);
    assert_eq!(take_fired(), vec![(HANDLE, IrqEvent::Overflow)]);
    assert!(!timeout.is_running());

    platform.advance_us(5_000);
    assert!(take_fired().is_empty());
}

#[test]
fn each_trigger_restarts_a_one_shot() {
    let platform = SimPlatform::new();
    let _timeout = armed(&platform, 200);

    for _ in 0..3 {
        platform.input_edge(pins::PD12, Edge::Rising);
        platform.advance_us(250);
        assert_eq!(take_fired(), vec![(HANDLE, IrqEvent::Overflow)]);
    }
}

#[test]
fn inactive_edge_does_not_trigger() {
    let platform = SimPlatform::new();
    let mut timeout = TriggeredTimeout::new(&platform, pins::PD12, Edge::Falling, HANDLE);
    timeout.attach(Some(record));
    timeout.set_period_us(100);

    platform.input_edge(pins::PD12, Edge::Rising);
    platform.advance_us(200);
    assert!(take_fired().is_empty());

    platform.input_edge(pins::PD12, Edge::Falling);
    platform.advance_us(100);
    assert_eq!(take_fired(), vec![(HANDLE, IrqEvent::Overflow)]);
}

#[test]
fn inverted_trigger_pin_flips_the_edge() {
    let platform = SimPlatform::new();
    let timeout = TriggeredTimeout::new(&platform, pins::PH11, Edge::Rising, HANDLE);
    assert_eq!(timeout.binding().polarity, Edge::Falling);
}

#[test]
fn rearming_before_expiry_replaces_the_period() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1_000);

    platform.input_edge(pins::PD12, Edge::Rising);
    platform.advance_us(500);
    timeout.set_period_us(2_000);
    assert_eq!(timeout.period_us(), Some(2_000));
    assert!(timeout.is_running());

    platform.advance_us(1_999);
    assert!(take_fired().is_empty());
    platform.advance_us(1);
    assert_eq!(take_fired(), vec![(HANDLE, IrqEvent::Overflow)]);
    platform.advance_us(3_000);
    assert!(take_fired().is_empty());
}

#[test]
fn rearming_discards_a_stale_expiry() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 100);

    timeout.disable_irq();
    platform.input_edge(pins::PD12, Edge::Rising);
    platform.advance_us(100);
    assert!(platform.timer(TimerId::Tim4).status().contains(Status::UIF));

    timeout.set_period_us(300);
    assert!(!platform.timer(TimerId::Tim4).status().contains(Status::UIF));
    assert!(platform.is_enabled(platform.timer_irq(TimerId::Tim4, TimerIrq::Update)));

    platform.advance_us(1);
    assert!(take_fired().is_empty());
}

#[test]
fn periodic_mode_fires_every_period() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 100);
    timeout.set_mode(TimeoutMode::Periodic);

    timeout.start();
    platform.advance_us(350);
    assert_eq!(take_fired().len(), 3);
    assert!(timeout.is_running());

    timeout.stop();
    platform.advance_us(500);
    assert!(take_fired().is_empty());
}

#[test]
fn long_periods_use_coarse_ticks() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1);
    timeout.set_period_ms(100);
    assert_eq!(timeout.period_us(), Some(100_000));

    let regs = platform.timer(TimerId::Tim4);
    assert_eq!(regs.read(Register::Psc), 84 * 500 - 1);
    assert_eq!(regs.read(Register::Arr), 199);

    platform.input_edge(pins::PD12, Edge::Rising);
    platform.advance_us(99_999);
    assert!(take_fired().is_empty());
    platform.advance_us(1);
    assert_eq!(take_fired(), vec![(HANDLE, IrqEvent::Overflow)]);
}

#[test]
fn period_in_seconds() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1);
    timeout.set_period_secs(0.002);
    assert_eq!(timeout.period_us(), Some(2_000));
}

#[test]
fn wide_timers_keep_microsecond_ticks() {
    let platform = SimPlatform::new();
    let mut timeout = TriggeredTimeout::new(&platform, pins::PA15, Edge::Rising, HANDLE);
    timeout.set_period_us(100_000);

    let regs = platform.timer(TimerId::Tim2);
    assert_eq!(regs.read(Register::Psc), 83);
    assert_eq!(regs.read(Register::Arr), 99_999);
}

#[test]
fn read_and_reset_follow_the_counter() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1_000);

    timeout.start();
    platform.advance_us(10);
    assert_eq!(timeout.read(), 10);

    timeout.reset();
    assert_eq!(timeout.read(), 0);
}

#[test]
fn stop_and_disable_irq_are_idempotent() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1_000);
    let regs = platform.timer(TimerId::Tim4);
    let irq = platform.timer_irq(TimerId::Tim4, TimerIrq::Update);

    timeout.stop();
    let cr1 = regs.read(Register::Cr1);
    timeout.stop();
    assert_eq!(regs.read(Register::Cr1), cr1);

    timeout.disable_irq();
    assert!(!platform.is_enabled(irq));
    timeout.disable_irq();
    assert!(!platform.is_enabled(irq));
    assert!(platform.vector(irq).is_some());
}

#[test]
fn detached_handler_leaves_expiry_silent() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 50);
    timeout.attach(None);

    platform.input_edge(pins::PD12, Edge::Rising);
    platform.advance_us(60);
    assert!(take_fired().is_empty());
    assert!(!platform.timer(TimerId::Tim4).status().contains(Status::UIF));
}

#[test]
fn unrepresentable_periods_are_rejected() {
    let platform = SimPlatform::new();
    let mut timeout = armed(&platform, 1);

    assert_eq!(timeout.try_set_period_us(0), Err(ConfigError::ZeroInterval));
    assert!(matches!(
        timeout.try_set_period_us(40_000_000),
        Err(ConfigError::PeriodOutOfRange { max: 0xFFFF, .. })
    ));
    // The last good period stays loaded.
    assert_eq!(timeout.period_us(), Some(1));
}

#[test]
fn fast_bus_overflows_the_prescaler() {
    let platform = SimPlatform::new();
    let mut timeout = TriggeredTimeout::new(&platform, pins::PA8, Edge::Rising, HANDLE);
    assert_eq!(
        timeout.try_set_period_us(100_000),
        Err(ConfigError::PrescalerOutOfRange {
            prescaler: 168 * 500 - 1
        })
    );
}

#[test]
#[should_panic(expected = "timer configuration failed")]
fn set_period_aborts_on_overflow() {
    let platform = SimPlatform::new();
    let mut timeout = TriggeredTimeout::new(&platform, pins::PA8, Edge::Rising, HANDLE);
    timeout.set_period_ms(100);
}
