//! Hardware abstraction for charger interrupt lines
//!
//! Charger drivers receive their status and fault lines from the board. This
//! crate describes how a driver asks for those lines and masks them while it
//! services a fault, without tying the driver to a GPIO or interrupt
//! controller implementation.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod interrupt;

// Re-export commonly used types
pub use error::{HalError, HalResult};
pub use interrupt::{Edge, InterruptLines, LineId};
