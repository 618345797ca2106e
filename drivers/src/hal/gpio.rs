//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! Timer inputs only need a pin routed to its timer through the
//! alternate-function multiplexer, so this layer is limited to pin identity
//! and alternate-function selection.

use core::fmt;

/// GPIO port letter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

impl Port {
    /// Port index (A = 0).
    pub const fn index(self) -> usize {
        self as usize
    }

    const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
            Port::F => 'F',
            Port::G => 'G',
            Port::H => 'H',
            Port::I => 'I',
        }
    }
}

/// Logical pin identifier (`PE9`, `PB4`, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pin {
    port: Port,
    number: u8,
}

impl Pin {
    pub const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }

    pub const fn port(self) -> Port {
        self.port
    }

    /// Pin number within its port (0..=15).
    pub const fn number(self) -> u8 {
        self.number
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.number)
    }
}

/// Internal pull resistor configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PullMode {
    /// No pull resistor (high impedance).
    #[default]
    None,
    /// Enable internal pull-up resistor.
    Up,
    /// Enable internal pull-down resistor.
    Down,
}

/// GPIO controller trait.
///
/// Routes pins to on-chip peripherals.
pub trait GpioController {
    /// Error type for GPIO operations.
    type Error: fmt::Debug;

    /// Switch `pin` to alternate function `af` with the given pull resistor.
    fn set_alternate_function(&self, pin: Pin, af: u8, pull: PullMode) -> Result<(), Self::Error>;
}
