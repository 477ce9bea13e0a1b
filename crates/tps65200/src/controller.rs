//! Charge controller: turns control intents into register sequences.

use charger_hal::InterruptLines;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::charger::Tps65200;
use crate::error::Result;
use crate::intent::{classify, ChargeMode, ControlIntent};
use crate::rate::{ChargeRate, ChargeRateConfig};
use crate::regs;

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The mode's register sequence ran (or had nothing to write).
    Applied(ChargeMode),
    /// Raw byte read by a fault-register check.
    Status(u8),
}

/// Controller state, only changed by dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ControllerState {
    /// Mode selected by the latest dispatch.
    pub(crate) mode: ChargeMode,
    /// Last charging mode written to the chip (Slow, Fast or Stop).
    pub(crate) charging: ChargeMode,
    pub(crate) last_intent: Option<ControlIntent>,
    /// Raw code of the latest request, before any override. Unknown codes
    /// are kept too.
    pub(crate) last_code: Option<u32>,
}

impl<I2C: I2c, IRQ: InterruptLines> Tps65200<I2C, IRQ> {
    /// Single control entry point.
    ///
    /// Returns [`Outcome::Status`] for [`ControlIntent::CheckInt1`] and
    /// [`ControlIntent::CheckInt2`], [`Outcome::Applied`] otherwise. A failed
    /// write aborts the sequence; the mode is still recorded.
    pub fn dispatch(&self, intent: ControlIntent) -> Result<Outcome> {
        let requested = intent.code();
        let intent = self.override_intent(intent);

        let mut state = self.controller.lock();
        state.last_code = Some(requested);
        state.last_intent = Some(intent);
        let mode = classify(intent, state.charging);
        if mode != state.mode {
            info!("{intent}: {:?} -> {mode:?}", state.mode);
        }
        state.mode = mode;

        match mode {
            ChargeMode::Slow | ChargeMode::Fast | ChargeMode::Stop => {
                state.charging = mode;
                self.write_sequence(mode)?;
                Ok(Outcome::Applied(mode))
            }
            ChargeMode::Check => match intent {
                ControlIntent::CheckInt1 | ControlIntent::CheckInt2 => {
                    let register = if intent == ControlIntent::CheckInt1 {
                        regs::INT1
                    } else {
                        regs::INT2
                    };
                    let value = self.transport.read_byte(register)?;
                    debug!("{intent}: {register:#04x} = {value:#04x}");
                    Ok(Outcome::Status(value))
                }
                _ => Ok(Outcome::Applied(mode)),
            },
            ChargeMode::DoNothing => {
                debug!("{intent}: nothing to do");
                Ok(Outcome::Applied(mode))
            }
        }
    }

    /// Dispatches a raw control code.
    ///
    /// Unknown codes are recorded as the last code, switch the controller to
    /// DoNothing without touching the chip and are rejected.
    pub fn dispatch_raw(&self, code: u32) -> Result<Outcome> {
        match ControlIntent::try_from(code) {
            Ok(intent) => self.dispatch(intent),
            Err(err) => {
                warn!("unrecognized control code {code:#x}");
                let mut state = self.controller.lock();
                state.last_code = Some(code);
                state.mode = ChargeMode::DoNothing;
                Err(err)
            }
        }
    }

    pub fn mode(&self) -> ChargeMode {
        self.controller.lock().mode
    }

    pub fn last_intent(&self) -> Option<ControlIntent> {
        self.controller.lock().last_intent
    }

    /// Raw code of the latest request, including codes that were rejected.
    pub fn last_code(&self) -> Option<u32> {
        self.controller.lock().last_code
    }

    pub fn charge_rate_config(&self) -> &ChargeRateConfig {
        &self.rates
    }

    /// Stores a clamped slow rate and rewrites the charge current if the
    /// charger is slow charging.
    pub fn set_slow_charge_rate(&self, index: u32) -> Result<ChargeRate> {
        let rate = self.rates.set_slow(index);
        info!("slow charge rate set to {rate}");
        self.reapply(ChargeMode::Slow)?;
        Ok(rate)
    }

    /// Stores a clamped fast rate and rewrites the charge current if the
    /// charger is fast charging.
    pub fn set_fast_charge_rate(&self, index: u32) -> Result<ChargeRate> {
        let rate = self.rates.set_fast(index);
        info!("fast charge rate set to {rate}");
        self.reapply(ChargeMode::Fast)?;
        Ok(rate)
    }

    fn override_intent(&self, intent: ControlIntent) -> ControlIntent {
        let Some(hook) = self.config.intent_override else {
            return intent;
        };
        let rewritten = hook(intent);
        if rewritten != intent {
            info!("intent override: {intent} -> {rewritten}");
        }
        rewritten
    }

    fn reapply(&self, mode: ChargeMode) -> Result<()> {
        let state = self.controller.lock();
        if state.charging == mode {
            self.write_sequence(mode)?;
        }
        Ok(())
    }

    /// Writes the register sequence for a charging mode in one bus session.
    ///
    /// Called with the controller lock held so sequences are applied in the
    /// order their modes were chosen.
    fn write_sequence(&self, mode: ChargeMode) -> Result<()> {
        match mode {
            ChargeMode::Slow | ChargeMode::Fast => {
                let rate = if mode == ChargeMode::Slow {
                    self.rates.slow()
                } else {
                    self.rates.fast()
                };
                info!("{mode:?} charging at {rate}");
                self.transport.session(|bus| {
                    bus.write_byte(regs::STATUS, regs::CHARGE_STATUS)?;
                    bus.write_byte(regs::CHARGE_CURRENT, regs::charge_current(rate.index()))?;
                    bus.write_byte(regs::MODE, regs::CHARGE_MODE)?;
                    bus.write_byte(regs::SAFETY, regs::CHARGE_SAFETY)?;
                    bus.dump();
                    Ok(())
                })
            }
            ChargeMode::Stop => {
                info!("charging stopped");
                self.transport.session(|bus| {
                    bus.write_byte(regs::STATUS, regs::STOP_STATUS)?;
                    bus.write_byte(regs::CHARGE_CURRENT, regs::STOP_CHARGE_CURRENT)?;
                    bus.dump();
                    Ok(())
                })
            }
            ChargeMode::DoNothing | ChargeMode::Check => Ok(()),
        }
    }
}
