//! STM32F4 (LQFP100/144) timer pin capabilities.

use crate::hal::gpio::{Pin, Port};
use crate::hal::pinmap::{PinFunction, PinMapEntry, function_data::pack};
use crate::hal::timer::TimerId;

pub const PA0: Pin = Pin::new(Port::A, 0);
pub const PA1: Pin = Pin::new(Port::A, 1);
pub const PA5: Pin = Pin::new(Port::A, 5);
pub const PA6: Pin = Pin::new(Port::A, 6);
pub const PA7: Pin = Pin::new(Port::A, 7);
pub const PA15: Pin = Pin::new(Port::A, 15);
pub const PB3: Pin = Pin::new(Port::B, 3);
pub const PB4: Pin = Pin::new(Port::B, 4);
pub const PB5: Pin = Pin::new(Port::B, 5);
pub const PB6: Pin = Pin::new(Port::B, 6);
pub const PB7: Pin = Pin::new(Port::B, 7);
pub const PC6: Pin = Pin::new(Port::C, 6);
pub const PC7: Pin = Pin::new(Port::C, 7);
pub const PE9: Pin = Pin::new(Port::E, 9);
pub const PE11: Pin = Pin::new(Port::E, 11);
pub const PH10: Pin = Pin::new(Port::H, 10);
pub const PH11: Pin = Pin::new(Port::H, 11);

const AF1_TIM1_2: u8 = 1;
const AF2_TIM3_4_5: u8 = 2;
const AF3_TIM8: u8 = 3;

pub static COUNTER: [PinMapEntry; 8] = [
    PinMapEntry::new(PA0, TimerId::Tim2, pack(AF1_TIM1_2, 1, false)),
    PinMapEntry::new(PA1, TimerId::Tim2, pack(AF1_TIM1_2, 2, false)),
    PinMapEntry::new(PA5, TimerId::Tim2, pack(AF1_TIM1_2, 1, false)),
    PinMapEntry::new(PB3, TimerId::Tim2, pack(AF1_TIM1_2, 2, false)),
    PinMapEntry::new(PA6, TimerId::Tim3, pack(AF2_TIM3_4_5, 1, false)),
    PinMapEntry::new(PA7, TimerId::Tim3, pack(AF2_TIM3_4_5, 2, false)),
    PinMapEntry::new(PC6, TimerId::Tim8, pack(AF3_TIM8, 1, false)),
    PinMapEntry::new(PC7, TimerId::Tim8, pack(AF3_TIM8, 2, false)),
];

pub static TRIGGER: [PinMapEntry; 6] = [
    PinMapEntry::new(PA0, TimerId::Tim2, pack(AF1_TIM1_2, 1, false)),
    PinMapEntry::new(PA1, TimerId::Tim2, pack(AF1_TIM1_2, 2, false)),
    PinMapEntry::new(PA15, TimerId::Tim2, pack(AF1_TIM1_2, 1, false)),
    PinMapEntry::new(PB3, TimerId::Tim2, pack(AF1_TIM1_2, 2, false)),
    PinMapEntry::new(PH10, TimerId::Tim5, pack(AF2_TIM3_4_5, 1, false)),
    PinMapEntry::new(PH11, TimerId::Tim5, pack(AF2_TIM3_4_5, 2, false)),
];

pub static ENCODER_A: [PinMapEntry; 4] = [
    PinMapEntry::new(PE9, TimerId::Tim1, pack(AF1_TIM1_2, 1, false)),
    PinMapEntry::new(PB4, TimerId::Tim3, pack(AF2_TIM3_4_5, 1, false)),
    PinMapEntry::new(PB6, TimerId::Tim4, pack(AF2_TIM3_4_5, 1, false)),
    PinMapEntry::new(PC6, TimerId::Tim8, pack(AF3_TIM8, 1, false)),
];

pub static ENCODER_B: [PinMapEntry; 4] = [
    PinMapEntry::new(PE11, TimerId::Tim1, pack(AF1_TIM1_2, 2, false)),
    PinMapEntry::new(PB5, TimerId::Tim3, pack(AF2_TIM3_4_5, 2, false)),
    PinMapEntry::new(PB7, TimerId::Tim4, pack(AF2_TIM3_4_5, 2, false)),
    PinMapEntry::new(PC7, TimerId::Tim8, pack(AF3_TIM8, 2, false)),
];

pub fn table(function: PinFunction) -> &'static [PinMapEntry] {
    match function {
        PinFunction::Counter => &COUNTER,
        PinFunction::Trigger => &TRIGGER,
        PinFunction::EncoderA => &ENCODER_A,
        PinFunction::EncoderB => &ENCODER_B,
    }
}
