//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The line id does not name a line on this board
    InvalidLine,
    /// Operation not supported by this implementation
    NotSupported,
    /// Line is already claimed by another driver
    Busy,
    /// Hardware error occurred
    HardwareError,
    /// Vendor-specific error code
    VendorError(i32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLine => write!(f, "invalid interrupt line"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Busy => write!(f, "interrupt line busy"),
            Self::HardwareError => write!(f, "hardware error"),
            Self::VendorError(code) => write!(f, "vendor error code: {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidLine => defmt::write!(fmt, "InvalidLine"),
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
            Self::Busy => defmt::write!(fmt, "Busy"),
            Self::HardwareError => defmt::write!(fmt, "HardwareError"),
            Self::VendorError(code) => defmt::write!(fmt, "VendorError({})", code),
        }
    }
}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
