//! Board configuration for a TPS65200 instance.

use core::time::Duration;

use charger_hal::LineId;

use crate::error::{Error, Result};
use crate::intent::ControlIntent;
use crate::rate::ChargeRate;

/// The chip forces a safe state if it sees no bus traffic for this long.
pub const HARDWARE_SAFETY_TIMEOUT: Duration = Duration::from_secs(32);

/// Default watchdog period, comfortably inside [`HARDWARE_SAFETY_TIMEOUT`].
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(15);

/// Delay between a fault edge and the first fault-register read.
pub const DEFAULT_FAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Poll period while an over-voltage fault persists.
pub const DEFAULT_FAULT_POLL: Duration = Duration::from_millis(5000);

/// Board hook that rewrites an intent before the controller sees it.
pub type IntentOverride = fn(ControlIntent) -> ControlIntent;

/// Factory-test policy: every charge-enabling request becomes fast charge.
///
/// Disable requests and chip-specific intents pass through untouched.
pub fn force_fast_charge(intent: ControlIntent) -> ControlIntent {
    if intent.enables_charging() {
        ControlIntent::EnableFastCharge
    } else {
        intent
    }
}

/// Configuration for one charger.
///
/// The bus address is the only mandatory field. Leaving an interrupt line out
/// disables the monitor that would have used it.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub address: u8,
    pub status_line: Option<LineId>,
    pub fault_line: Option<LineId>,
    /// Manufacturing self-test result for the fitted battery.
    pub self_test_passed: bool,
    pub intent_override: Option<IntentOverride>,
    /// Applied by [`crate::Tps65200::start`].
    pub initial_intent: Option<ControlIntent>,
    pub slow_rate: ChargeRate,
    pub fast_rate: ChargeRate,
    pub watchdog_interval: Duration,
    pub fault_debounce: Duration,
    pub fault_poll: Duration,
}

impl PlatformConfig {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            status_line: None,
            fault_line: None,
            self_test_passed: false,
            intent_override: None,
            initial_intent: Some(ControlIntent::Vdpm476V),
            slow_rate: ChargeRate::DEFAULT_SLOW,
            fast_rate: ChargeRate::DEFAULT_FAST,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
            fault_debounce: DEFAULT_FAULT_DEBOUNCE,
            fault_poll: DEFAULT_FAULT_POLL,
        }
    }

    /// Creates a new configuration builder.
    pub fn builder(address: u8) -> PlatformConfigBuilder {
        PlatformConfigBuilder {
            config: Self::new(address),
        }
    }

    /// Rejects configurations the driver cannot run safely with.
    pub fn validate(&self) -> Result<()> {
        if self.address > 0x7F {
            return Err(Error::InvalidArgument("bus address is not a 7-bit address"));
        }
        if self.watchdog_interval.is_zero() || self.watchdog_interval >= HARDWARE_SAFETY_TIMEOUT {
            return Err(Error::InvalidArgument(
                "watchdog interval must be within the hardware safety timeout",
            ));
        }
        if self.fault_debounce.is_zero() || self.fault_poll.is_zero() {
            return Err(Error::InvalidArgument("fault timings must be non-zero"));
        }
        if let (Some(status), Some(fault)) = (self.status_line, self.fault_line) {
            if status == fault {
                return Err(Error::InvalidArgument("status and fault lines must differ"));
            }
        }
        Ok(())
    }
}

/// Builder for [`PlatformConfig`].
#[derive(Debug, Clone)]
pub struct PlatformConfigBuilder {
    config: PlatformConfig,
}

impl PlatformConfigBuilder {
    pub fn status_line(mut self, line: LineId) -> Self {
        self.config.status_line = Some(line);
        self
    }

    pub fn fault_line(mut self, line: LineId) -> Self {
        self.config.fault_line = Some(line);
        self
    }

    pub fn self_test_passed(mut self, passed: bool) -> Self {
        self.config.self_test_passed = passed;
        self
    }

    pub fn intent_override(mut self, hook: IntentOverride) -> Self {
        self.config.intent_override = Some(hook);
        self
    }

    /// Sets the intent applied at start, or none to leave the chip untouched.
    pub fn initial_intent(mut self, intent: Option<ControlIntent>) -> Self {
        self.config.initial_intent = intent;
        self
    }

    pub fn slow_rate(mut self, rate: ChargeRate) -> Self {
        self.config.slow_rate = rate;
        self
    }

    pub fn fast_rate(mut self, rate: ChargeRate) -> Self {
        self.config.fast_rate = rate;
        self
    }

    pub fn watchdog_interval(mut self, interval: Duration) -> Self {
        self.config.watchdog_interval = interval;
        self
    }

    /// Sets the debounce delay and the persistent-fault poll period.
    pub fn fault_timing(mut self, debounce: Duration, poll: Duration) -> Self {
        self.config.fault_debounce = debounce;
        self.config.fault_poll = poll;
        self
    }

    pub fn build(self) -> PlatformConfig {
        self.config
    }
}
