//! Periodic check that keeps the chip's safety timer from expiring.
//!
//! The TPS65200 drops to a safe state when its bus stays idle past
//! [`crate::config::HARDWARE_SAFETY_TIMEOUT`]. Each run touches every register
//! of interest and re-arms itself, so the next run is one interval after this
//! one actually happened.

use core::sync::atomic::{AtomicU32, Ordering};

use charger_hal::InterruptLines;
use embedded_hal::i2c::I2c;
use log::{debug, error};

use crate::charger::Tps65200;
use crate::intent::ControlIntent;
use crate::regs::RegisterDump;
use crate::work::Work;

#[derive(Debug, Default)]
pub(crate) struct Watchdog {
    runs: AtomicU32,
}

impl Watchdog {
    pub(crate) const fn new() -> Self {
        Self {
            runs: AtomicU32::new(0),
        }
    }
}

impl<I2C: I2c, IRQ: InterruptLines> Tps65200<I2C, IRQ> {
    /// Runs one watchdog check and schedules the next.
    pub fn watchdog_check(&self) -> RegisterDump {
        let run = self.watchdog.runs.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("watchdog check #{run}");
        if let Err(err) = self.dispatch(ControlIntent::CheckCharge) {
            error!("watchdog check failed: {err}");
        }
        let dump = self.transport.dump();
        self.arm_watchdog();
        dump
    }

    /// Number of watchdog checks run so far.
    pub fn watchdog_runs(&self) -> u32 {
        self.watchdog.runs.load(Ordering::Relaxed)
    }

    pub(crate) fn arm_watchdog(&self) {
        self.timers
            .arm(Work::WatchdogCheck, self.config.watchdog_interval);
    }

    pub(crate) fn disarm_watchdog(&self) {
        self.timers.cancel(Work::WatchdogCheck);
        self.work.cancel(Work::WatchdogCheck);
    }
}
