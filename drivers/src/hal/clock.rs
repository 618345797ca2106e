//! Clock tree queries.
//!
//! Timers are clocked from a peripheral bus. The timer kernel clock equals
//! the bus clock when the bus prescaler is 1 and twice the bus clock
//! otherwise.

/// Peripheral bus a timer hangs off.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bus {
    Apb1,
    Apb2,
}

/// Prescaler between the AHB clock and a peripheral bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BusDivider {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

impl BusDivider {
    pub const fn ratio(self) -> u32 {
        match self {
            BusDivider::Div1 => 1,
            BusDivider::Div2 => 2,
            BusDivider::Div4 => 4,
            BusDivider::Div8 => 8,
            BusDivider::Div16 => 16,
        }
    }
}

/// Clock tree provider.
pub trait ClockTree {
    /// Current bus clock in Hz.
    fn bus_frequency(&self, bus: Bus) -> u32;

    /// Current bus prescaler.
    fn bus_divider(&self, bus: Bus) -> BusDivider;

    /// Kernel clock of timers on `bus`, in Hz.
    fn timer_clock(&self, bus: Bus) -> u32 {
        let pclk = self.bus_frequency(bus);
        match self.bus_divider(bus) {
            BusDivider::Div1 => pclk,
            _ => pclk.saturating_mul(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u32, BusDivider);

    impl ClockTree for Fixed {
        fn bus_frequency(&self, _bus: Bus) -> u32 {
            self.0
        }

        fn bus_divider(&self, _bus: Bus) -> BusDivider {
            self.1
        }
    }

    #[test]
    fn timer_clock_doubles_behind_a_prescaled_bus() {
        assert_eq!(Fixed(42_000_000, BusDivider::Div4).timer_clock(Bus::Apb1), 84_000_000);
        assert_eq!(Fixed(42_000_000, BusDivider::Div2).timer_clock(Bus::Apb1), 84_000_000);
    }

    #[test]
    fn timer_clock_matches_an_undivided_bus() {
        assert_eq!(Fixed(16_000_000, BusDivider::Div1).timer_clock(Bus::Apb2), 16_000_000);
    }
}
