//! Mode configurators.
//!
//! Register sequences that put a timer into one of the three device modes.
//! Callers hold a critical section around each sequence; nothing here masks
//! interrupts itself.

use crate::hal::timer::{
    CR2_MMS_MASK, Ccer, Channel, Cr1, Dier, Edge, Egr, Register, SMCR_MSM, SlaveMode, Status,
    TimerRegisters, TriggerInput, ccmr_input, ccmr_output,
};
use crate::resolver::PeripheralBinding;
use crate::timebase::Timebase;

/// Channels reserved as encoder alarm compare units.
pub const ALARM_CHANNELS: [Channel; 2] = [Channel::Ch3, Channel::Ch4];

// ============================================================================
// Building Blocks
// ============================================================================

/// Program prescaler, period and clock division, then latch them with an
/// update event. The update flag that event raises is cleared.
pub fn configure_time_base<R: TimerRegisters + ?Sized>(regs: &R, tb: &Timebase) {
    regs.modify(Register::Cr1, |cr1| {
        (cr1 & !(Cr1::DIR | Cr1::CKD | Cr1::ARPE).bits()) | tb.clock_division.bits()
    });
    regs.write(Register::Arr, tb.period);
    regs.write(Register::Psc, tb.prescaler);
    regs.write(Register::Egr, Egr::UG.bits());
    regs.clear_flags(Status::UIF);
}

/// TRGO on reset, master/slave synchronisation off.
pub fn configure_master_reset<R: TimerRegisters + ?Sized>(regs: &R) {
    regs.clear_bits(Register::Cr2, CR2_MMS_MASK);
    regs.clear_bits(Register::Smcr, SMCR_MSM);
}

/// Map `channel` directly onto its TI input with the given filter and
/// edge. The capture itself stays disabled.
pub fn configure_input<R: TimerRegisters + ?Sized>(regs: &R, channel: Channel, edge: Edge, filter: u8) {
    regs.clear_bits(Register::Ccer, channel.enable().bits());

    let (ccmr, shift) = channel.ccmr();
    let field = ccmr_input::DIRECT_TI | (u32::from(filter) & 0xF) << ccmr_input::FILTER_SHIFT;
    regs.write_field(ccmr, 0xFF << shift, field << shift);

    let polarity = match edge {
        Edge::Rising => Ccer::empty(),
        Edge::Falling => channel.falling(),
    };
    regs.write_field(Register::Ccer, channel.polarity_mask().bits(), polarity.bits());
}

/// Select the slave mode controller's trigger input and mode.
pub fn configure_slave<R: TimerRegisters + ?Sized>(regs: &R, mode: SlaveMode, trigger: Option<TriggerInput>) {
    let ts = trigger.map_or(0, |t| (t as u32) << TriggerInput::SHIFT);
    regs.write_field(Register::Smcr, SlaveMode::MASK | TriggerInput::MASK, mode as u32 | ts);
}

/// Configure `channel` as an output-compare unit that goes active on match.
/// The channel interrupt is left disabled.
pub fn configure_output_compare<R: TimerRegisters + ?Sized>(regs: &R, channel: Channel, pulse: u32) {
    regs.clear_bits(Register::Dier, channel.interrupt().bits());
    regs.clear_bits(Register::Ccer, channel.enable().bits());

    let (ccmr, shift) = channel.ccmr();
    let field = ccmr_output::ACTIVE_ON_MATCH << ccmr_output::MODE_SHIFT;
    regs.write_field(ccmr, 0xFF << shift, field << shift);

    regs.write(channel.ccr(), pulse);
    regs.clear_flags(channel.flag());
}

// ============================================================================
// Device Modes
// ============================================================================

/// Free-running counter clocked by edges on the bound input (external clock
/// mode 1). The counter is left stopped.
pub fn configure_counter<R: TimerRegisters + ?Sized>(
    regs: &R,
    binding: &PeripheralBinding,
    trigger: TriggerInput,
) {
    regs.clear_bits(Register::Cr1, Cr1::CEN.bits());
    configure_time_base(regs, &Timebase::free_running(regs.counter_max()));
    configure_input(regs, binding.channel(), binding.polarity, binding.filter);
    configure_slave(regs, SlaveMode::ExternalClock1, Some(trigger));
    configure_master_reset(regs);

    log::debug!(
        "{:?} counting {:?} edges on {:?}",
        binding.timer,
        binding.polarity,
        trigger
    );
}

/// Quadrature decode on channels 1 and 2 with channels 3 and 4 reserved as
/// alarm compare units. The counter is left stopped.
pub fn configure_encoder<R: TimerRegisters + ?Sized>(regs: &R, binding: &PeripheralBinding) {
    regs.clear_bits(Register::Cr1, Cr1::CEN.bits());
    configure_time_base(regs, &Timebase::free_running(regs.counter_max()));

    configure_slave(regs, SlaveMode::Disabled, None);
    configure_input(regs, Channel::Ch1, Edge::Rising, binding.filter);
    configure_input(regs, Channel::Ch2, Edge::Rising, binding.filter);
    configure_slave(regs, SlaveMode::Encoder1, None);
    regs.set_bits(Register::Ccer, (Ccer::CC1E | Ccer::CC2E).bits());

    for channel in ALARM_CHANNELS {
        configure_output_compare(regs, channel, 0);
    }
    configure_master_reset(regs);

    log::debug!("{:?} decoding quadrature", binding.timer);
}

/// Internal time base started by the bound trigger input. The counter is
/// left stopped with the update interrupt disabled; [`reprogram_timeout`]
/// loads the period.
pub fn configure_triggered<R: TimerRegisters + ?Sized>(
    regs: &R,
    binding: &PeripheralBinding,
    trigger: TriggerInput,
) {
    regs.clear_bits(Register::Cr1, Cr1::CEN.bits());
    regs.clear_bits(Register::Dier, Dier::UIE.bits());
    configure_time_base(regs, &Timebase::free_running(regs.counter_max()));
    configure_input(regs, binding.channel(), binding.polarity, binding.filter);
    configure_slave(regs, SlaveMode::Trigger, Some(trigger));
    configure_master_reset(regs);

    log::debug!(
        "{:?} waiting for {:?} trigger on {:?}",
        binding.timer,
        binding.polarity,
        trigger
    );
}

/// Load a new timeout period.
///
/// The counter is stopped first so a half-written PSC/ARR pair can never
/// expire, then any stale update flag is cleared. A timer that was running
/// restarts from zero with the new period.
pub fn reprogram_timeout<R: TimerRegisters + ?Sized>(regs: &R, tb: &Timebase, one_shot: bool) {
    let was_running = regs.is_counting();
    regs.clear_bits(Register::Cr1, Cr1::CEN.bits());

    configure_time_base(regs, tb);
    if one_shot {
        regs.set_bits(Register::Cr1, Cr1::OPM.bits());
    } else {
        regs.clear_bits(Register::Cr1, Cr1::OPM.bits());
    }
    regs.write(Register::Cnt, 0);
    regs.clear_flags(Status::UIF);

    if was_running {
        regs.set_bits(Register::Cr1, Cr1::CEN.bits());
    }
}
