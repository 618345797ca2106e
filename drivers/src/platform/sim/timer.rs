//! Behavioural model of one timer instance.
//!
//! Models the parts of the register contract the devices depend on:
//!
//! - SR flags are rc_w0; EGR is write-only and reads as zero
//! - UG reloads the prescaler, zeroes the counter and raises UIF
//! - TG raises TIF
//! - external clock mode 1 counts active edges on the selected TI input
//! - trigger mode sets CEN on an active edge of the selected TI input
//! - encoder mode 1 counts on TI2 edges, up when TI2FP2 equals TI1FP1
//!   after the edge, honouring the CCxP polarity of both inputs
//! - one-pulse mode clears CEN on the update event
//! - a counter equal to CCRx on an output channel raises CCxIF

use core::cell::Cell;

use crate::hal::timer::{
    Channel, Cr1, Edge, Egr, Register, SlaveMode, Status, TimerId, TimerRegisters, TriggerInput,
};

const CHANNELS: [Channel; 4] = [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4];

#[derive(Debug)]
pub struct SimTimer {
    id: TimerId,
    regs: [Cell<u32>; Register::WORDS],
    /// Kernel clocks accumulated towards the next prescaled tick.
    prescaler_count: Cell<u32>,
    /// Raw levels of the TI1 and TI2 inputs.
    inputs: [Cell<bool>; 2],
}

impl SimTimer {
    pub fn new(id: TimerId) -> Self {
        Self {
            id,
            regs: core::array::from_fn(|_| Cell::new(0)),
            prescaler_count: Cell::new(0),
            inputs: [Cell::new(false), Cell::new(false)],
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    fn get(&self, reg: Register) -> u32 {
        self.regs[reg.word()].get()
    }

    fn set(&self, reg: Register, value: u32) {
        self.regs[reg.word()].set(value);
    }

    fn raise(&self, flags: Status) {
        self.set(Register::Sr, self.get(Register::Sr) | flags.bits());
    }

    fn cr1(&self) -> Cr1 {
        Cr1::from_bits_retain(self.get(Register::Cr1))
    }

    fn slave_mode(&self) -> SlaveMode {
        SlaveMode::from_bits(self.get(Register::Smcr))
    }

    fn stop_on_update(&self) {
        if self.cr1().contains(Cr1::OPM) {
            self.set(Register::Cr1, self.get(Register::Cr1) & !Cr1::CEN.bits());
        }
    }

    fn compare(&self) {
        let cnt = self.get(Register::Cnt);
        for channel in CHANNELS {
            let (ccmr, shift) = channel.ccmr();
            let is_output = (self.get(ccmr) >> shift) & 0b11 == 0;
            if is_output && cnt == self.get(channel.ccr()) {
                self.raise(channel.flag());
            }
        }
    }

    /// Advance the counter by one tick in the counting direction.
    fn tick(&self, down: bool) {
        let cnt = self.get(Register::Cnt);
        let arr = self.get(Register::Arr);
        let next = if down {
            if cnt == 0 { None } else { Some(cnt - 1) }
        } else if cnt >= arr {
            None
        } else {
            Some(cnt + 1)
        };

        match next {
            Some(value) => self.set(Register::Cnt, value),
            None => {
                self.set(Register::Cnt, if down { arr } else { 0 });
                self.raise(Status::UIF);
                self.stop_on_update();
            }
        }
        self.compare();
    }

    /// Run `cycles` kernel clock cycles through the prescaler.
    ///
    /// Only counts while CEN is set and the counter is clocked internally.
    pub fn run_cycles(&self, cycles: u64) {
        let internal = matches!(
            self.slave_mode(),
            SlaveMode::Disabled | SlaveMode::Trigger | SlaveMode::Reset | SlaveMode::Gated
        );
        if !internal || !self.cr1().contains(Cr1::CEN) {
            return;
        }

        let divisor = u64::from(self.get(Register::Psc)) + 1;
        let total = u64::from(self.prescaler_count.get()) + cycles;
        self.prescaler_count.set((total % divisor) as u32);
        for _ in 0..total / divisor {
            if !self.cr1().contains(Cr1::CEN) {
                break;
            }
            self.tick(false);
        }
    }

    /// Whether an `edge` on `channel`'s input is the active edge.
    fn is_active(&self, channel: Channel, edge: Edge) -> bool {
        let falling = self.get(Register::Ccer) & channel.falling().bits() != 0;
        falling == (edge == Edge::Falling)
    }

    /// Apply an edge on the input of `channel` to the slave mode controller.
    pub fn input_edge(&self, channel: Channel, edge: Edge) {
        let smcr = self.get(Register::Smcr);
        if TriggerInput::from_bits(smcr).map(TriggerInput::channel) != Some(channel) {
            return;
        }
        if !self.is_active(channel, edge) {
            return;
        }

        match self.slave_mode() {
            SlaveMode::ExternalClock1 if self.cr1().contains(Cr1::CEN) => {
                let divisor = self.get(Register::Psc) + 1;
                let count = self.prescaler_count.get() + 1;
                if count >= divisor {
                    self.prescaler_count.set(0);
                    self.tick(false);
                } else {
                    self.prescaler_count.set(count);
                }
            }
            SlaveMode::Trigger => {
                self.raise(Status::TIF);
                self.set(Register::Cr1, self.get(Register::Cr1) | Cr1::CEN.bits());
            }
            _ => {}
        }
    }

    /// Raw level of the TIx input behind `channel`.
    pub fn input_level(&self, channel: Channel) -> bool {
        ti_index(channel).is_some_and(|i| self.inputs[i].get())
    }

    /// Level of TIxFPx after the CCxP polarity selection.
    fn filtered_level(&self, channel: Channel) -> bool {
        let inverted = self.get(Register::Ccer) & channel.falling().bits() != 0;
        self.input_level(channel) != inverted
    }

    /// Drive the TIx input behind `channel` to `high`.
    ///
    /// In an encoder mode a level change on a counted input moves the
    /// counter one step, in the direction the other input's level selects.
    pub fn set_input_level(&self, channel: Channel, high: bool) {
        let Some(index) = ti_index(channel) else {
            return;
        };
        if self.inputs[index].replace(high) == high {
            return;
        }
        if !self.cr1().contains(Cr1::CEN) {
            return;
        }

        let counted = match self.slave_mode() {
            SlaveMode::Encoder1 => channel == Channel::Ch2,
            SlaveMode::Encoder2 => channel == Channel::Ch1,
            SlaveMode::Encoder3 => true,
            _ => false,
        };
        if !counted {
            return;
        }

        let ti1 = self.filtered_level(Channel::Ch1);
        let ti2 = self.filtered_level(Channel::Ch2);
        let up = match channel {
            Channel::Ch2 => ti1 == ti2,
            _ => ti1 != ti2,
        };
        self.tick(!up);
    }
}

fn ti_index(channel: Channel) -> Option<usize> {
    match channel {
        Channel::Ch1 => Some(0),
        Channel::Ch2 => Some(1),
        _ => None,
    }
}

impl TimerRegisters for SimTimer {
    fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::Egr => 0,
            _ => self.get(reg),
        }
    }

    fn write(&self, reg: Register, value: u32) {
        let max = self.counter_max();
        match reg {
            Register::Sr => self.set(Register::Sr, self.get(Register::Sr) & value),
            Register::Egr => {
                let egr = Egr::from_bits_truncate(value);
                if egr.contains(Egr::UG) {
                    self.prescaler_count.set(0);
                    self.set(Register::Cnt, 0);
                    self.raise(Status::UIF);
                }
                if egr.contains(Egr::TG) {
                    self.raise(Status::TIF);
                }
            }
            Register::Psc => self.set(reg, value & 0xFFFF),
            Register::Cnt | Register::Arr | Register::Ccr1 | Register::Ccr2 | Register::Ccr3 | Register::Ccr4 => {
                self.set(reg, value & max)
            }
            _ => self.set(reg, value),
        }
    }

    fn counter_max(&self) -> u32 {
        if self.id.is_32bit() { u32::MAX } else { 0xFFFF }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::timer::Ccer;

    #[test]
    fn status_flags_clear_on_zero_writes_only() {
        let t = SimTimer::new(TimerId::Tim3);
        t.write(Register::Egr, (Egr::UG | Egr::TG).bits());
        assert_eq!(t.status(), Status::UIF | Status::TIF);

        t.clear_flags(Status::UIF);
        assert_eq!(t.status(), Status::TIF);
        assert_eq!(t.read(Register::Egr), 0);
    }

    #[test]
    fn one_pulse_mode_stops_on_update() {
        let t = SimTimer::new(TimerId::Tim3);
        t.write(Register::Arr, 2);
        t.write(Register::Cr1, (Cr1::CEN | Cr1::OPM).bits());
        t.run_cycles(10);
        assert!(!t.is_counting());
        assert_eq!(t.read(Register::Cnt), 0);
        assert!(t.status().contains(Status::UIF));
    }

    #[test]
    fn registers_are_clamped_to_counter_width() {
        let narrow = SimTimer::new(TimerId::Tim4);
        narrow.write(Register::Arr, 0x1_2345);
        assert_eq!(narrow.read(Register::Arr), 0x2345);

        let wide = SimTimer::new(TimerId::Tim5);
        wide.write(Register::Arr, 0x1_2345);
        assert_eq!(wide.read(Register::Arr), 0x1_2345);
    }

    fn encoder(mode: SlaveMode) -> SimTimer {
        let t = SimTimer::new(TimerId::Tim3);
        t.write(Register::Ccmr1, 0x0101);
        t.write(Register::Smcr, mode as u32);
        t.write(Register::Arr, 0xFFFF);
        t.write(Register::Cr1, Cr1::CEN.bits());
        t
    }

    /// One full cycle with phase A leading: A up, B up, A down, B down.
    fn a_leads_b(t: &SimTimer) {
        t.set_input_level(Channel::Ch1, true);
        t.set_input_level(Channel::Ch2, true);
        t.set_input_level(Channel::Ch1, false);
        t.set_input_level(Channel::Ch2, false);
    }

    /// One full cycle with phase B leading: B up, A up, B down, A down.
    fn b_leads_a(t: &SimTimer) {
        t.set_input_level(Channel::Ch2, true);
        t.set_input_level(Channel::Ch1, true);
        t.set_input_level(Channel::Ch2, false);
        t.set_input_level(Channel::Ch1, false);
    }

    #[test]
    fn phase_order_sets_the_direction() {
        let t = encoder(SlaveMode::Encoder1);
        a_leads_b(&t);
        assert_eq!(t.read(Register::Cnt), 2);

        b_leads_a(&t);
        b_leads_a(&t);
        assert_eq!(t.read(Register::Cnt), 0xFFFE);
    }

    #[test]
    fn mode_selects_the_counted_inputs() {
        let t = encoder(SlaveMode::Encoder3);
        a_leads_b(&t);
        assert_eq!(t.read(Register::Cnt), 4);

        let t = encoder(SlaveMode::Encoder2);
        t.set_input_level(Channel::Ch2, true);
        t.set_input_level(Channel::Ch2, false);
        assert_eq!(t.read(Register::Cnt), 0);
    }

    #[test]
    fn inverted_input_reverses_the_count() {
        let t = encoder(SlaveMode::Encoder1);
        t.write(Register::Ccer, Ccer::CC1P.bits());
        a_leads_b(&t);
        assert_eq!(t.read(Register::Cnt), 0xFFFE);
    }

    #[test]
    fn levels_outside_encoder_mode_do_not_count() {
        let t = encoder(SlaveMode::Disabled);
        a_leads_b(&t);
        assert_eq!(t.read(Register::Cnt), 0);
        assert!(!t.input_level(Channel::Ch1));
    }
}
