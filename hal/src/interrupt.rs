//! Interrupt line abstraction

use core::fmt;

use crate::error::HalResult;

/// Board-specific identifier of an interrupt-capable line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineId(pub u32);

impl LineId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line{}", self.0)
    }
}

/// Interrupt trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Rising edge
    Rising,
    /// Falling edge
    Falling,
    /// Both edges
    Both,
}

/// Interrupt lines handed to a driver by the board.
///
/// `disable` and `enable` are called from the driver's interrupt entry point
/// and its deferred worker respectively, so implementations must not block.
pub trait InterruptLines {
    /// Claim `line` and route its `edge` to the driver's handler
    fn request(&mut self, line: LineId, edge: Edge) -> HalResult<()>;

    /// Unmask the line
    fn enable(&mut self, line: LineId) -> HalResult<()>;

    /// Mask the line without waiting for a running handler
    fn disable(&mut self, line: LineId) -> HalResult<()>;
}

impl<T: InterruptLines + ?Sized> InterruptLines for &mut T {
    fn request(&mut self, line: LineId, edge: Edge) -> HalResult<()> {
        T::request(self, line, edge)
    }

    fn enable(&mut self, line: LineId) -> HalResult<()> {
        T::enable(self, line)
    }

    fn disable(&mut self, line: LineId) -> HalResult<()> {
        T::disable(self, line)
    }
}
