//! Driver context.

use core::time::Duration;

use charger_hal::{Edge, InterruptLines, LineId};
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use crate::config::PlatformConfig;
use crate::controller::ControllerState;
use crate::error::Result;
use crate::fault::FaultMonitor;
use crate::notify::{Notifier, NotifierRegistry};
use crate::rate::ChargeRateConfig;
use crate::regs::{self, RegisterDump};
use crate::status::StatusMonitor;
use crate::sync::{IrqMutex, Mutex};
use crate::time::TimerWheel;
use crate::transport::Transport;
use crate::watchdog::Watchdog;
use crate::work::{Work, WorkQueue};

/// A TPS65200 charger and everything the driver tracks about it.
///
/// All operations take `&self`; share the driver between the interrupt
/// glue, the timer tick and the worker thread with an `Arc`.
///
/// The component operations live next to their state: [`crate::controller`],
/// [`crate::fault`], [`crate::status`] and [`crate::watchdog`].
pub struct Tps65200<I2C, IRQ> {
    pub(crate) config: PlatformConfig,
    pub(crate) transport: Transport<I2C>,
    pub(crate) lines: IrqMutex<IRQ>,
    pub(crate) rates: ChargeRateConfig,
    pub(crate) controller: Mutex<ControllerState>,
    pub(crate) fault: FaultMonitor,
    pub(crate) status: StatusMonitor,
    pub(crate) watchdog: Watchdog,
    pub(crate) notifiers: NotifierRegistry,
    pub(crate) work: WorkQueue,
    pub(crate) timers: TimerWheel,
}

impl<I2C: I2c, IRQ: InterruptLines> Tps65200<I2C, IRQ> {
    /// Validates `config` and claims the configured interrupt lines.
    ///
    /// A line that is not configured, or that the board refuses, disables the
    /// monitor that would have used it; that is logged, not an error.
    pub fn new(i2c: I2C, mut lines: IRQ, config: PlatformConfig) -> Result<Self> {
        config.validate()?;

        let status_line = request_line(&mut lines, config.status_line, Edge::Rising, "status");
        let fault_line = request_line(&mut lines, config.fault_line, Edge::Falling, "fault");
        info!(
            "tps65200 at {:#04x}, self test {}",
            config.address,
            if config.self_test_passed { "passed" } else { "not passed" }
        );

        Ok(Self {
            transport: Transport::new(i2c, config.address),
            lines: IrqMutex::new(lines),
            rates: ChargeRateConfig::new(config.slow_rate, config.fast_rate),
            controller: Mutex::new(ControllerState::default()),
            fault: FaultMonitor::new(fault_line),
            status: StatusMonitor::new(status_line),
            watchdog: Watchdog::new(),
            notifiers: NotifierRegistry::new(),
            work: WorkQueue::new(),
            timers: TimerWheel::new(),
            config,
        })
    }

    /// Applies the initial intent and starts the watchdog.
    pub fn start(&self) -> Result<()> {
        self.arm_watchdog();
        if let Some(intent) = self.config.initial_intent {
            self.dispatch(intent)?;
        }
        info!("tps65200 started");
        Ok(())
    }

    /// Stops all timers and switches the shunt monitor off.
    ///
    /// A fault escalation still in flight is closed and its line unmasked. A
    /// line that cannot be unmasked is reported after the shunt monitor is
    /// off.
    pub fn shutdown(&self) -> Result<()> {
        self.disarm_watchdog();
        let unmasked = self.abort_escalation();
        self.work.cancel(Work::ClearStatus);
        self.set_status_monitoring(false);

        self.transport.session(|bus| {
            let status = bus.read_byte(regs::STATUS)?;
            bus.write_byte(regs::STATUS, status & !regs::STATUS_SHUNT_MONITOR)
        })?;
        unmasked?;
        info!("tps65200 shut down");
        Ok(())
    }

    /// Moves driver time forward, queuing the work whose timers expired.
    ///
    /// Never touches the bus. Returns how many items were queued.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let mut queued = 0;
        for work in self.timers.advance(elapsed) {
            match self.work.queue(work) {
                Ok(true) => queued += 1,
                Ok(false) => {}
                Err(err) => error!("cannot queue {work:?}: {err}"),
            }
        }
        queued
    }

    /// Runs queued work until the queue is empty. Returns how many items ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(work) = self.work.pop() {
            match work {
                Work::ClearStatus => {
                    if let Err(err) = self.clear_status() {
                        error!("status clear failed: {err}");
                    }
                }
                Work::FaultRecheck => {
                    let escalation = self.fault_recheck();
                    info!("fault recheck: {escalation:?}");
                }
                Work::WatchdogCheck => {
                    self.watchdog_check();
                }
            }
            ran += 1;
        }
        ran
    }

    pub fn register_notifier(&self, notifier: Notifier) -> Result<()> {
        self.notifiers.register(notifier)
    }

    /// Reads and logs the diagnostic register set.
    pub fn dump_registers(&self) -> RegisterDump {
        self.transport.dump()
    }

    pub fn self_test_passed(&self) -> bool {
        self.config.self_test_passed
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Whether a fault escalation holds the fault line masked.
    pub fn fault_in_flight(&self) -> bool {
        self.fault.in_flight()
    }

    /// Time until the next watchdog check, if one is scheduled.
    pub fn next_watchdog(&self) -> Option<Duration> {
        self.timers.remaining(Work::WatchdogCheck)
    }

    /// Number of work items waiting for [`Tps65200::run_pending`].
    pub fn pending_work(&self) -> usize {
        self.work.len()
    }

    /// Gives back the bus and the interrupt lines.
    pub fn release(self) -> (I2C, IRQ) {
        (self.transport.release(), self.lines.into_inner())
    }
}

fn request_line<IRQ: InterruptLines>(
    lines: &mut IRQ,
    line: Option<LineId>,
    edge: Edge,
    what: &str,
) -> Option<LineId> {
    let Some(line) = line else {
        warn!("no {what} line configured, {what} monitoring disabled");
        return None;
    };
    match lines.request(line, edge) {
        Ok(()) => Some(line),
        Err(err) => {
            error!("request of {what} line {line} failed: {err}, {what} monitoring disabled");
            None
        }
    }
}
