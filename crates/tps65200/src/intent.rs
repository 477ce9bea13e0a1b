//! Control intents and their classification into charge modes.

use core::fmt;

use crate::error::Error;

/// A request from the charging-policy layer.
///
/// The numeric codes are the ones exchanged with that layer; see
/// [`ControlIntent::code`] and the `TryFrom<u32>` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ControlIntent {
    DisableCharge = 0x00,
    EnableSlowCharge = 0x01,
    EnableFastCharge = 0x02,
    EnableWirelessCharge = 0x04,
    /// Watchdog and policy liveness check; no register access.
    CheckCharge = 0x40,
    /// Read the INT1 (over-voltage) fault register.
    CheckInt1 = 0x43,
    /// Read the INT2 (reverse-current) fault register.
    CheckInt2 = 0x44,
    /// Battery too hot: stop charging.
    OvertempVreg = 0x45,
    /// Battery back in range: resume slow charging if not charging already.
    NormaltempVreg = 0x46,
    CheckControl = 0x47,
    EnableLimitedCharge = 0x48,
    ClearLimitedCharge = 0x49,
    /// Raise the VDPM threshold to 4.76 V.
    Vdpm476V = 0x4A,
    /// Restore the original VDPM threshold.
    VdpmOriginV = 0x4B,
}

impl ControlIntent {
    pub const ALL: [ControlIntent; 14] = [
        Self::DisableCharge,
        Self::EnableSlowCharge,
        Self::EnableFastCharge,
        Self::EnableWirelessCharge,
        Self::CheckCharge,
        Self::CheckInt1,
        Self::CheckInt2,
        Self::OvertempVreg,
        Self::NormaltempVreg,
        Self::CheckControl,
        Self::EnableLimitedCharge,
        Self::ClearLimitedCharge,
        Self::Vdpm476V,
        Self::VdpmOriginV,
    ];

    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Whether this is one of the power-supply requests that turn charging on.
    pub const fn enables_charging(self) -> bool {
        matches!(
            self,
            Self::EnableSlowCharge | Self::EnableFastCharge | Self::EnableWirelessCharge
        )
    }
}

impl TryFrom<u32> for ControlIntent {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|intent| intent.code() == code)
            .ok_or(Error::InvalidArgument("unrecognized control intent"))
    }
}

impl fmt::Display for ControlIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:#04x})", self, self.code())
    }
}

/// How the controller drives the chip for the latest intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeMode {
    #[default]
    DoNothing,
    Slow,
    Fast,
    Stop,
    Check,
}

impl ChargeMode {
    /// Slow and Fast are the modes in which the charger is actually charging.
    pub const fn is_charging(self) -> bool {
        matches!(self, Self::Slow | Self::Fast)
    }
}

/// Maps an intent to a charge mode.
///
/// `charging` is the last charging mode the controller applied (Slow, Fast,
/// Stop or DoNothing before anything was applied). It only matters for
/// [`ControlIntent::NormaltempVreg`], which resumes slow charging unless the
/// charger is already charging.
pub fn classify(intent: ControlIntent, charging: ChargeMode) -> ChargeMode {
    use ControlIntent::*;

    match intent {
        Vdpm476V | VdpmOriginV | EnableLimitedCharge | EnableWirelessCharge | EnableSlowCharge => {
            ChargeMode::Slow
        }
        EnableFastCharge => ChargeMode::Fast,
        OvertempVreg | DisableCharge => ChargeMode::Stop,
        ClearLimitedCharge => ChargeMode::DoNothing,
        CheckCharge | CheckInt1 | CheckInt2 | CheckControl => ChargeMode::Check,
        NormaltempVreg if charging.is_charging() => charging,
        NormaltempVreg => ChargeMode::Slow,
    }
}
