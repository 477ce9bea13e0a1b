//! # tps65200
//!
//! Driver for the TI TPS65200 single-cell Li-ion charger, written against
//! `embedded-hal` 1.0 I2C and the [`charger_hal`] interrupt-line traits.
//!
//! ## Module Overview
//! - [`transport`]  – Serialised register access and bus sessions.
//! - [`controller`] – Control intents to register sequences.
//! - [`fault`]      – Fault-line debounce, poll and notification protocol.
//! - [`status`]     – Status-change interrupt and status clear.
//! - [`watchdog`]   – Periodic check that feeds the chip's safety timer.
//! - [`notify`]     – Fault notification registry.
//! - [`work`] / [`time`] – Deferred work queue and one-shot timers.
//!
//! Interrupt entry points and [`Tps65200::advance`] never touch the bus; they
//! queue work that [`Tps65200::run_pending`] carries out.

#[cfg(not(any(feature = "std", feature = "lock-free")))]
compile_error!("enable either the `std` or the `lock-free` feature");

pub mod charger;
pub mod config;
pub mod controller;
pub mod error;
pub mod fault;
pub mod intent;
pub mod notify;
pub mod rate;
pub mod regs;
pub mod status;
pub mod sync;
pub mod time;
pub mod transport;
pub mod watchdog;
pub mod work;

pub use charger::Tps65200;
pub use config::{force_fast_charge, IntentOverride, PlatformConfig, PlatformConfigBuilder};
pub use controller::Outcome;
pub use error::{Error, Result};
pub use fault::{Escalation, FaultChannel, FaultPhase, FaultState};
pub use intent::{classify, ChargeMode, ControlIntent};
pub use notify::{ChannelFilter, FaultCallback, Notifier, NotifierRegistry};
pub use rate::{ChargeRate, ChargeRateConfig};
pub use regs::RegisterDump;
pub use work::Work;

pub use charger_hal::{Edge, HalError, InterruptLines, LineId};

#[cfg(test)]
mod tests;
