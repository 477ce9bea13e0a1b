//! Fault interrupt handling.
//!
//! A falling edge on the fault line starts an escalation. The handler masks
//! the line and schedules a recheck; the recheck works out which fault
//! register raised the line, polls while an over-voltage fault persists, and
//! unmasks the line once the escalation reaches a terminal step. The line is
//! masked exactly once and unmasked exactly once per escalation.

use core::fmt;

use charger_hal::{InterruptLines, LineId};
use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};

use crate::charger::Tps65200;
use crate::controller::Outcome;
use crate::error::Result;
use crate::intent::ControlIntent;
use crate::regs;
use crate::sync::IrqMutex;
use crate::work::Work;

/// One of the chip's two fault registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultChannel {
    /// Input over-voltage, reported in INT1.
    Int1,
    /// Reverse current, reported in INT2.
    Int2,
}

impl FaultChannel {
    pub const ALL: [FaultChannel; 2] = [Self::Int1, Self::Int2];

    pub const fn register(self) -> u8 {
        match self {
            Self::Int1 => regs::INT1,
            Self::Int2 => regs::INT2,
        }
    }

    pub const fn fault_bit(self) -> u8 {
        match self {
            Self::Int1 => regs::INT1_OVER_VOLTAGE,
            Self::Int2 => regs::INT2_REVERSE_CURRENT,
        }
    }

    /// The intent that reads this channel's register.
    pub const fn check_intent(self) -> ControlIntent {
        match self {
            Self::Int1 => ControlIntent::CheckInt1,
            Self::Int2 => ControlIntent::CheckInt2,
        }
    }

    /// Numeric id handed to notifier consumers that speak raw codes.
    pub const fn id(self) -> u32 {
        self.check_intent().code()
    }

    const fn index(self) -> usize {
        match self {
            Self::Int1 => 0,
            Self::Int2 => 1,
        }
    }
}

impl fmt::Display for FaultChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int1 => f.write_str("INT1"),
            Self::Int2 => f.write_str("INT2"),
        }
    }
}

/// Where a channel is in the current escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultPhase {
    /// Not involved in any escalation.
    #[default]
    Idle,
    /// The fault line fired and this channel has not been ruled out yet.
    Pending,
    /// The fault bit was seen set.
    Confirmed,
    /// A confirmed or suspected fault went away.
    Cleared,
}

/// Per-channel fault state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultState {
    /// The fault bit was set at the last read and has not been seen clear.
    pub latched: bool,
    pub phase: FaultPhase,
}

/// Outcome of one recheck step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Escalation {
    /// Fault bit set. INT1 keeps polling; INT2 is terminal.
    Confirmed(FaultChannel),
    /// INT1 fault went away; the line is unmasked.
    Cleared(FaultChannel),
    /// Over-voltage suspected; rechecking after the debounce delay.
    Rescheduled,
    /// The line fired with neither fault bit set; the line is unmasked.
    Anomalous,
    /// No escalation was in flight.
    Idle,
}

/// Which register the next recheck starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Unclassified,
    OverVoltage,
}

struct MonitorState {
    probe: Probe,
    in_flight: bool,
    channels: [FaultState; 2],
}

impl MonitorState {
    fn channel(&mut self, channel: FaultChannel) -> &mut FaultState {
        &mut self.channels[channel.index()]
    }
}

/// Fault-line state owned by the driver.
///
/// The interrupt entry point and the worker both update it, so it lives in an
/// [`IrqMutex`].
pub(crate) struct FaultMonitor {
    line: Option<LineId>,
    state: IrqMutex<MonitorState>,
}

impl FaultMonitor {
    pub(crate) const fn new(line: Option<LineId>) -> Self {
        Self {
            line,
            state: IrqMutex::new(MonitorState {
                probe: Probe::Unclassified,
                in_flight: false,
                channels: [FaultState {
                    latched: false,
                    phase: FaultPhase::Idle,
                }; 2],
            }),
        }
    }

    pub(crate) fn line(&self) -> Option<LineId> {
        self.line
    }

    pub(crate) fn state(&self, channel: FaultChannel) -> FaultState {
        self.state.with(|state| state.channels[channel.index()])
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.state.with(|state| state.in_flight)
    }

    fn update<R>(&self, f: impl FnOnce(&mut MonitorState) -> R) -> R {
        self.state.with(f)
    }
}

impl<I2C: I2c, IRQ: InterruptLines> Tps65200<I2C, IRQ> {
    /// Entry point for the fault line's falling edge.
    ///
    /// Masks the line and schedules the first recheck. Returns `false` when no
    /// fault line is configured or an escalation is already in flight. Only
    /// critical-section state is touched, so this is safe to call from the
    /// interrupt handler itself.
    pub fn on_fault_interrupt(&self) -> bool {
        let Some(line) = self.fault.line() else {
            return false;
        };

        let accepted = self.fault.update(|state| {
            if state.in_flight {
                return false;
            }
            state.in_flight = true;
            state.probe = Probe::Unclassified;
            for channel in FaultChannel::ALL {
                state.channel(channel).phase = FaultPhase::Pending;
            }
            true
        });
        if !accepted {
            warn!("fault edge on {line} during an escalation, ignored");
            return false;
        }

        info!("fault interrupt on {line}");
        if let Err(err) = self.mask_fault_line(line) {
            error!("failed to mask {line}: {err}");
        }
        self.timers.arm(Work::FaultRecheck, self.config.fault_debounce);
        true
    }

    /// Runs one recheck step of the current escalation.
    pub fn fault_recheck(&self) -> Escalation {
        let Some(line) = self.fault.line() else {
            return Escalation::Idle;
        };
        let Some(probe) = self
            .fault
            .update(|state| state.in_flight.then_some(state.probe))
        else {
            return Escalation::Idle;
        };

        match probe {
            Probe::OverVoltage => self.recheck_over_voltage(line),
            Probe::Unclassified => self.classify_fault(line),
        }
    }

    pub fn fault_state(&self, channel: FaultChannel) -> FaultState {
        self.fault.state(channel)
    }

    /// Ends an escalation that is still in flight without a terminal read.
    ///
    /// The recheck is cancelled and the line unmasked, so the next edge starts
    /// a fresh escalation. Channel phases are left as they were.
    pub(crate) fn abort_escalation(&self) -> Result<()> {
        let Some(line) = self.fault.line() else {
            return Ok(());
        };
        if !self.fault.in_flight() {
            return Ok(());
        }
        info!("fault escalation on {line} aborted");
        self.end_escalation();
        self.unmask_fault_line(line)
    }

    fn recheck_over_voltage(&self, line: LineId) -> Escalation {
        let channel = FaultChannel::Int1;
        let value = self.confirm_fault_bits(channel);

        if value & channel.fault_bit() != 0 {
            let entered = self.fault.update(|state| {
                let fault = state.channel(channel);
                let entered = fault.phase != FaultPhase::Confirmed;
                fault.latched = true;
                fault.phase = FaultPhase::Confirmed;
                entered
            });
            if entered {
                warn!("input over-voltage confirmed");
                self.notifiers.notify(channel, 1);
            }
            self.timers.arm(Work::FaultRecheck, self.config.fault_poll);
            return Escalation::Confirmed(channel);
        }

        self.fault.update(|state| {
            *state.channel(channel) = FaultState {
                latched: false,
                phase: FaultPhase::Cleared,
            };
        });
        info!("input over-voltage cleared");
        self.notifiers.notify(channel, 0);
        self.finish_escalation(line);
        Escalation::Cleared(channel)
    }

    fn classify_fault(&self, line: LineId) -> Escalation {
        let int2 = self.check_fault(FaultChannel::Int2);
        debug!("INT2 = {int2:#04x}");

        if int2 & regs::INT2_REVERSE_CURRENT != 0 {
            self.confirm_fault_bits(FaultChannel::Int2);
            warn!("reverse current protection triggered");
            if let Err(err) = self.clear_status() {
                error!("status clear after reverse current failed: {err}");
            }
            self.fault.update(|state| {
                *state.channel(FaultChannel::Int2) = FaultState {
                    latched: true,
                    phase: FaultPhase::Confirmed,
                };
                state.channel(FaultChannel::Int1).phase = FaultPhase::Idle;
            });
            self.notifiers.notify(FaultChannel::Int2, 1);
            self.finish_escalation(line);
            return Escalation::Confirmed(FaultChannel::Int2);
        }

        self.fault
            .update(|state| state.channel(FaultChannel::Int2).phase = FaultPhase::Idle);

        let int1 = self.check_fault(FaultChannel::Int1);
        if int1 & regs::INT1_OVER_VOLTAGE != 0 {
            self.fault.update(|state| state.probe = Probe::OverVoltage);
            self.timers.arm(Work::FaultRecheck, self.config.fault_debounce);
            return Escalation::Rescheduled;
        }

        warn!("fault interrupt on {line} without a fault bit set");
        self.fault
            .update(|state| state.channel(FaultChannel::Int1).phase = FaultPhase::Idle);
        self.finish_escalation(line);
        Escalation::Anomalous
    }

    /// Reads a fault register through the controller. A failed read is zero.
    fn check_fault(&self, channel: FaultChannel) -> u8 {
        match self.dispatch(channel.check_intent()) {
            Ok(Outcome::Status(value)) => value,
            Ok(_) | Err(_) => 0,
        }
    }

    /// Reads a fault register twice and keeps the second value.
    ///
    /// The first read clears the latched bit, so a bit still set on the second
    /// read is a live fault.
    fn confirm_fault_bits(&self, channel: FaultChannel) -> u8 {
        self.check_fault(channel);
        self.check_fault(channel)
    }

    fn finish_escalation(&self, line: LineId) {
        self.end_escalation();
        if let Err(err) = self.unmask_fault_line(line) {
            error!("failed to unmask {line}: {err}");
        }
    }

    fn end_escalation(&self) {
        self.timers.cancel(Work::FaultRecheck);
        self.work.cancel(Work::FaultRecheck);
        self.fault.update(|state| state.in_flight = false);
    }

    fn mask_fault_line(&self, line: LineId) -> Result<()> {
        self.lines.with(|lines| lines.disable(line))?;
        Ok(())
    }

    fn unmask_fault_line(&self, line: LineId) -> Result<()> {
        self.lines.with(|lines| lines.enable(line))?;
        Ok(())
    }
}
