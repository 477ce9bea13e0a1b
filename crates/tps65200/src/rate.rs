//! Charge-rate table and the slow/fast rate configuration.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// Index into the TPS65200 charge-current table.
///
/// Index `n` selects `550 + 100 * n` mA, i.e. a sense voltage of
/// `11 + 2 * n` mV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargeRate(u8);

impl ChargeRate {
    /// 550 mA
    pub const MIN: Self = Self(0);
    /// 1350 mA, the last valid table entry
    pub const MAX: Self = Self(8);
    /// Default slow-charge rate, 550 mA
    pub const DEFAULT_SLOW: Self = Self(0);
    /// Default fast-charge rate, 1050 mA
    pub const DEFAULT_FAST: Self = Self(5);

    const BASE_MA: u32 = 550;
    const STEP_MA: u32 = 100;

    /// Builds a rate from any requested index, clamping to the table.
    pub fn clamped(index: u32) -> Self {
        if index > Self::MAX.0 as u32 {
            Self::MAX
        } else {
            Self(index as u8)
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub const fn milliamps(self) -> u32 {
        Self::BASE_MA + self.0 as u32 * Self::STEP_MA
    }
}

impl fmt::Display for ChargeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mA", self.milliamps())
    }
}

/// Slow and fast charge rates.
///
/// Written by the configuration path and read by the controller whenever it
/// builds a Slow or Fast sequence; an update is picked up by the next dispatch.
#[derive(Debug)]
pub struct ChargeRateConfig {
    slow: AtomicU8,
    fast: AtomicU8,
}

impl ChargeRateConfig {
    pub const fn new(slow: ChargeRate, fast: ChargeRate) -> Self {
        Self {
            slow: AtomicU8::new(slow.0),
            fast: AtomicU8::new(fast.0),
        }
    }

    pub fn slow(&self) -> ChargeRate {
        ChargeRate(self.slow.load(Ordering::Acquire))
    }

    pub fn fast(&self) -> ChargeRate {
        ChargeRate(self.fast.load(Ordering::Acquire))
    }

    /// Stores a clamped slow rate and returns what was stored.
    pub fn set_slow(&self, index: u32) -> ChargeRate {
        let rate = ChargeRate::clamped(index);
        self.slow.store(rate.0, Ordering::Release);
        rate
    }

    /// Stores a clamped fast rate and returns what was stored.
    pub fn set_fast(&self, index: u32) -> ChargeRate {
        let rate = ChargeRate::clamped(index);
        self.fast.store(rate.0, Ordering::Release);
        rate
    }
}

impl Default for ChargeRateConfig {
    fn default() -> Self {
        Self::new(ChargeRate::DEFAULT_SLOW, ChargeRate::DEFAULT_FAST)
    }
}
