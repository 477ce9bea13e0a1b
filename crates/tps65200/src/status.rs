//! Status-change interrupt.
//!
//! When monitoring is armed, a rising edge on the status line resets the
//! charger through the status-clear sequence. Monitoring starts disarmed and
//! disarms itself each time the sequence runs.

use charger_hal::{InterruptLines, LineId};
use embedded_hal::i2c::I2c;
use log::{debug, error, info};

use crate::charger::Tps65200;
use crate::error::Result;
use crate::regs;
use crate::sync::IrqCell;
use crate::work::Work;

pub(crate) struct StatusMonitor {
    line: Option<LineId>,
    armed: IrqCell<bool>,
}

impl StatusMonitor {
    pub(crate) const fn new(line: Option<LineId>) -> Self {
        Self {
            line,
            armed: IrqCell::new(false),
        }
    }

    pub(crate) fn line(&self) -> Option<LineId> {
        self.line
    }
}

impl<I2C: I2c, IRQ: InterruptLines> Tps65200<I2C, IRQ> {
    /// Entry point for the status line's rising edge.
    ///
    /// Returns whether a status clear was queued.
    pub fn on_status_interrupt(&self) -> bool {
        let Some(line) = self.status.line() else {
            return false;
        };
        let armed = self.status.armed.get();
        debug!("status interrupt on {line}, monitoring armed: {armed}");
        if !armed {
            return false;
        }
        match self.work.queue(Work::ClearStatus) {
            Ok(queued) => queued,
            Err(err) => {
                error!("cannot queue status clear: {err}");
                false
            }
        }
    }

    /// Disarms status monitoring and resets the charger.
    pub fn clear_status(&self) -> Result<()> {
        self.status.armed.set(false);
        info!("clearing charger status");
        self.transport.session(|bus| {
            bus.write_byte(regs::CHARGE_CURRENT, regs::STOP_CHARGE_CURRENT)?;
            bus.write_byte(regs::STATUS, regs::STOP_STATUS)
        })
    }

    /// Arms or disarms status monitoring.
    ///
    /// Returns `false` without changing anything when no status line is in
    /// use.
    pub fn set_status_monitoring(&self, enabled: bool) -> bool {
        if self.status.line().is_none() {
            return false;
        }
        if self.status.armed.replace(enabled) != enabled {
            info!("status monitoring {}", if enabled { "armed" } else { "disarmed" });
        }
        true
    }

    pub fn status_monitoring(&self) -> bool {
        self.status.armed.get()
    }
}
