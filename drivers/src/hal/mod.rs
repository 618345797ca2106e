//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines the collaborators the timer devices are written
//! against. Platforms implement them; devices never touch a concrete SoC
//! type directly.
//!
//! # Available Interfaces
//!
//! - [`timer`]: General-purpose timer register block, channels, bit fields
//! - [`interrupt`]: Interrupt controller (vector install, mask/unmask)
//! - [`clock`]: Bus clock frequency and divider queries
//! - [`gpio`]: Pin identities and alternate-function routing
//! - [`pinmap`]: Static pin-capability tables

pub mod clock;
pub mod gpio;
pub mod interrupt;
pub mod pinmap;
pub mod timer;
