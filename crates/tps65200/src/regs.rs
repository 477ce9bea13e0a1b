//! TPS65200 register map and the fixed values this driver writes.

/// Status and shunt-monitor control
pub const STATUS: u8 = 0x00;
/// Charge-current control
pub const CHARGE_CURRENT: u8 = 0x01;
/// Mode control
pub const MODE: u8 = 0x02;
/// Safety and termination control
pub const SAFETY: u8 = 0x03;
/// Status-change interrupt status
pub const CHG_STAT: u8 = 0x06;
/// INT1 fault register (over-voltage)
pub const INT1: u8 = 0x08;
/// INT2 fault register (reverse current)
pub const INT2: u8 = 0x09;
/// Control readback
pub const CONTROL: u8 = 0x0A;

/// Over-voltage fault bit in [`INT1`]
pub const INT1_OVER_VOLTAGE: u8 = 0x40;
/// Reverse-current fault bit in [`INT2`]
pub const INT2_REVERSE_CURRENT: u8 = 0x80;

/// Shunt monitor enable in [`STATUS`]; cleared at shutdown to save ~35 uA.
pub const STATUS_SHUNT_MONITOR: u8 = 0x20;

/// Charging: [`STATUS`] value
pub const CHARGE_STATUS: u8 = 0x2A;
/// Charging: [`MODE`] value
pub const CHARGE_MODE: u8 = 0xE3;
/// Charging: [`SAFETY`] value
pub const CHARGE_SAFETY: u8 = 0x83;
/// Charging: fixed bits of [`CHARGE_CURRENT`] around the rate field
pub const CHARGE_CURRENT_BASE: u8 = 0x81;
/// Position of the rate field in [`CHARGE_CURRENT`]
pub const CHARGE_RATE_SHIFT: u8 = 3;

/// Charging stopped: [`STATUS`] value
pub const STOP_STATUS: u8 = 0x28;
/// Charging stopped: [`CHARGE_CURRENT`] value
pub const STOP_CHARGE_CURRENT: u8 = 0x29;

/// Composes the charge-current register for a rate index.
pub const fn charge_current(rate: u8) -> u8 {
    CHARGE_CURRENT_BASE | (rate << CHARGE_RATE_SHIFT)
}

/// Registers captured by a diagnostic dump, in the order they are read.
pub const DUMP_ORDER: [u8; 8] = [CHARGE_CURRENT, STATUS, SAFETY, MODE, CHG_STAT, INT1, INT2, CONTROL];

/// Snapshot of the registers the driver cares about.
///
/// Reading the dump touches the fault registers too, which clears their
/// latched bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDump {
    pub status: u8,
    pub charge_current: u8,
    pub mode: u8,
    pub safety: u8,
    pub chg_stat: u8,
    pub int1: u8,
    pub int2: u8,
    pub control: u8,
}

impl RegisterDump {
    pub(crate) fn set(&mut self, register: u8, value: u8) {
        match register {
            STATUS => self.status = value,
            CHARGE_CURRENT => self.charge_current = value,
            MODE => self.mode = value,
            SAFETY => self.safety = value,
            CHG_STAT => self.chg_stat = value,
            INT1 => self.int1 = value,
            INT2 => self.int2 = value,
            CONTROL => self.control = value,
            _ => {}
        }
    }
}
