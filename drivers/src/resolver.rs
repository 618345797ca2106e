//! Resource resolver.
//!
//! Maps logical pins to a timer instance, channel and polarity using the
//! platform's pin-capability tables. Lookup is pure: the same pin always
//! resolves to the same binding.

use crate::error::{ConfigError, Result};
use crate::hal::gpio::{GpioController, Pin, PullMode};
use crate::hal::pinmap::{PinFunction, PinMap, function_data};
use crate::hal::timer::{Channel, Edge, TimerId, TriggerInput};

/// Input filter applied to every timer input (fSAMPLING = fDTS/32, N = 8).
pub const INPUT_FILTER: u8 = 0xF;

/// Decoded function data of one table entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinRoute {
    pub pin: Pin,
    pub af: u8,
    pub channel: Channel,
    pub inverted: bool,
}

impl PinRoute {
    /// Decode a function-data word, rejecting unknown bits and channels.
    pub fn decode(pin: Pin, data: u32) -> Result<Self> {
        let malformed = ConfigError::InvalidFunction { pin, data };
        if data & !function_data::VALID_MASK != 0 {
            return Err(malformed);
        }
        let number = (data & function_data::CHANNEL_MASK) >> function_data::CHANNEL_SHIFT;
        let channel = Channel::from_number(number as u8).ok_or(malformed)?;

        Ok(Self {
            pin,
            af: (data & function_data::AF_MASK) as u8,
            channel,
            inverted: data & function_data::INVERTED != 0,
        })
    }
}

/// Pins, timer and signal conditioning owned by one device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PeripheralBinding {
    pub timer: TimerId,
    /// Clock, trigger or encoder-A input.
    pub primary: PinRoute,
    /// Encoder-B input.
    pub secondary: Option<PinRoute>,
    /// Active edge after applying the board inversion flag.
    pub polarity: Edge,
    pub filter: u8,
}

impl PeripheralBinding {
    pub fn channel(&self) -> Channel {
        self.primary.channel
    }

    /// Slave-mode trigger input fed by the primary channel.
    pub fn trigger_input(&self) -> Result<TriggerInput> {
        TriggerInput::for_channel(self.primary.channel).ok_or(ConfigError::UnsupportedChannel {
            timer: self.timer,
            channel: self.primary.channel.number(),
            function: PinFunction::Trigger,
        })
    }

    /// Route every bound pin to the timer through the GPIO multiplexer.
    pub fn route<G: GpioController + ?Sized>(&self, gpio: &G) -> Result<()> {
        for route in core::iter::once(&self.primary).chain(self.secondary.as_ref()) {
            gpio.set_alternate_function(route.pin, route.af, PullMode::None)
                .map_err(|_| ConfigError::PinSetup { pin: route.pin })?;
        }
        Ok(())
    }
}

fn lookup<M: PinMap + ?Sized>(map: &M, pin: Pin, function: PinFunction) -> Result<(TimerId, PinRoute)> {
    let entry = map
        .lookup(pin, function)
        .ok_or(ConfigError::PinNotFound { pin, function })?;
    let route = PinRoute::decode(pin, entry.data)?;

    let usable = match function {
        PinFunction::Counter | PinFunction::Trigger => {
            TriggerInput::for_channel(route.channel).is_some()
        }
        PinFunction::EncoderA => route.channel == Channel::Ch1,
        PinFunction::EncoderB => route.channel == Channel::Ch2,
    };
    if !usable {
        return Err(ConfigError::UnsupportedChannel {
            timer: entry.timer,
            channel: route.channel.number(),
            function,
        });
    }

    Ok((entry.timer, route))
}

/// Resolve a single-pin device (counter or triggered timeout).
///
/// The resulting polarity is `edge`, flipped when the board inverts the
/// signal.
pub fn resolve<M: PinMap + ?Sized>(
    map: &M,
    pin: Pin,
    function: PinFunction,
    edge: Edge,
) -> Result<PeripheralBinding> {
    let (timer, route) = lookup(map, pin, function)?;
    let polarity = if route.inverted { edge.inverted() } else { edge };

    log::debug!(
        "{pin} -> {timer:?} ch{} ({function:?}, {polarity:?})",
        route.channel.number()
    );

    Ok(PeripheralBinding {
        timer,
        primary: route,
        secondary: None,
        polarity,
        filter: INPUT_FILTER,
    })
}

/// Resolve an encoder pin pair. Both pins must sit on the same timer, A on
/// channel 1 and B on channel 2. Encoder inputs always decode on rising
/// edges.
pub fn resolve_pair<M: PinMap + ?Sized>(map: &M, pin_a: Pin, pin_b: Pin) -> Result<PeripheralBinding> {
    let (timer_a, a) = lookup(map, pin_a, PinFunction::EncoderA)?;
    let (timer_b, b) = lookup(map, pin_b, PinFunction::EncoderB)?;
    if timer_a != timer_b {
        return Err(ConfigError::TimerMismatch {
            a: timer_a,
            b: timer_b,
        });
    }

    log::debug!("{pin_a}/{pin_b} -> {timer_a:?} encoder");

    Ok(PeripheralBinding {
        timer: timer_a,
        primary: a,
        secondary: Some(b),
        polarity: Edge::Rising,
        filter: INPUT_FILTER,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::gpio::Port;
    use crate::hal::pinmap::{PinMapEntry, function_data::pack};

    const PA0: Pin = Pin::new(Port::A, 0);
    const PA1: Pin = Pin::new(Port::A, 1);
    const PB4: Pin = Pin::new(Port::B, 4);
    const PB5: Pin = Pin::new(Port::B, 5);
    const PB6: Pin = Pin::new(Port::B, 6);
    const PC8: Pin = Pin::new(Port::C, 8);
    const PD2: Pin = Pin::new(Port::D, 2);

    struct Board;

    const INPUTS: [PinMapEntry; 4] = [
        PinMapEntry::new(PA0, TimerId::Tim2, pack(1, 1, false)),
        PinMapEntry::new(PA1, TimerId::Tim2, pack(1, 2, true)),
        PinMapEntry::new(PC8, TimerId::Tim3, pack(2, 3, false)),
        PinMapEntry::new(PD2, TimerId::Tim3, 0x1000),
    ];
    const ENC_A: [PinMapEntry; 2] = [
        PinMapEntry::new(PB4, TimerId::Tim3, pack(2, 1, false)),
        PinMapEntry::new(PB6, TimerId::Tim4, pack(2, 1, false)),
    ];
    const ENC_B: [PinMapEntry; 1] = [PinMapEntry::new(PB5, TimerId::Tim3, pack(2, 2, false))];

    impl PinMap for Board {
        fn table(&self, function: PinFunction) -> &[PinMapEntry] {
            match function {
                PinFunction::Counter | PinFunction::Trigger => &INPUTS,
                PinFunction::EncoderA => &ENC_A,
                PinFunction::EncoderB => &ENC_B,
            }
        }
    }

    #[test]
    fn resolution_is_stable() {
        let first = resolve(&Board, PA0, PinFunction::Counter, Edge::Rising).unwrap();
        for _ in 0..4 {
            let again = resolve(&Board, PA0, PinFunction::Counter, Edge::Rising).unwrap();
            assert_eq!(first, again);
        }
        assert_eq!(first.timer, TimerId::Tim2);
        assert_eq!(first.channel(), Channel::Ch1);
        assert_eq!(first.primary.af, 1);
        assert_eq!(first.trigger_input(), Ok(TriggerInput::Ti1Fp1));
    }

    #[test]
    fn inverted_pins_flip_the_edge() {
        let b = resolve(&Board, PA1, PinFunction::Trigger, Edge::Falling).unwrap();
        assert!(b.primary.inverted);
        assert_eq!(b.polarity, Edge::Rising);
        assert_eq!(b.filter, INPUT_FILTER);
    }

    #[test]
    fn unknown_pin_is_rejected() {
        assert_eq!(
            resolve(&Board, PB6, PinFunction::Counter, Edge::Rising),
            Err(ConfigError::PinNotFound {
                pin: PB6,
                function: PinFunction::Counter
            })
        );
    }

    #[test]
    fn channel_three_cannot_drive_the_trigger() {
        assert!(matches!(
            resolve(&Board, PC8, PinFunction::Trigger, Edge::Rising),
            Err(ConfigError::UnsupportedChannel { channel: 3, .. })
        ));
    }

    #[test]
    fn malformed_data_is_rejected() {
        assert!(matches!(
            resolve(&Board, PD2, PinFunction::Counter, Edge::Rising),
            Err(ConfigError::InvalidFunction { data: 0x1000, .. })
        ));
        assert!(matches!(
            PinRoute::decode(PD2, pack(1, 7, false)),
            Err(ConfigError::InvalidFunction { .. })
        ));
    }

    #[test]
    fn encoder_pair_shares_a_timer() {
        let b = resolve_pair(&Board, PB4, PB5).unwrap();
        assert_eq!(b.timer, TimerId::Tim3);
        assert_eq!(b.secondary.map(|r| r.channel), Some(Channel::Ch2));
        assert_eq!(b.polarity, Edge::Rising);

        assert_eq!(
            resolve_pair(&Board, PB6, PB5),
            Err(ConfigError::TimerMismatch {
                a: TimerId::Tim4,
                b: TimerId::Tim3
            })
        );
    }
}
