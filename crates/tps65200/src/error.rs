//! Driver error type.

use charger_hal::HalError;
use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Errors reported by the TPS65200 driver.
///
/// A missing interrupt line is deliberately absent: the driver disables the
/// affected monitor and logs it instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A bus transaction failed. Hardware state is unknown afterwards.
    #[error("bus transaction on register {register:#04x} failed: {kind}")]
    Transport { register: u8, kind: ErrorKind },
    /// The request was rejected before touching the hardware.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The deferred work queue has no free slot.
    #[error("deferred work queue is full")]
    QueueFull,
    /// The board's interrupt line layer refused an operation.
    #[error("interrupt line error: {0}")]
    Interrupt(#[from] HalError),
}

/// Result type used throughout the driver
pub type Result<T> = core::result::Result<T, Error>;
