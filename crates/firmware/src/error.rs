//! Demo error type
//!
//! Every platform call the runners make is fallible. A failure is fatal for
//! the demo: the runner returns it tagged with the call that failed, and the
//! host logs it and aborts.

use core::fmt;

use embedded_hal::digital::ErrorKind;
use platform::{PowerError, SleepError};

/// Platform call a [`DemoError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwCall {
    /// Read the active power configuration
    GetConfiguration,
    /// Apply a power configuration
    Configure,
    /// Write the DFS lock report
    DumpLocks,
    /// Read the realized CPU frequency
    ReadCpuFrequency,
    /// Arm the timer wake source
    EnableTimerWakeup,
    /// Enter light sleep
    LightSleep,
    /// Enter deep sleep
    DeepSleep,
}

impl HwCall {
    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetConfiguration => "get_configuration",
            Self::Configure => "configure",
            Self::DumpLocks => "dump_locks",
            Self::ReadCpuFrequency => "read_cpu_frequency",
            Self::EnableTimerWakeup => "enable_timer_wakeup",
            Self::LightSleep => "light_sleep_start",
            Self::DeepSleep => "deep_sleep_start",
        }
    }
}

impl fmt::Display for HwCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fatal demo failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DemoError {
    /// Power-management service call failed
    #[error("{call} failed: {cause}")]
    Power {
        /// Failing call
        call: HwCall,
        /// Platform error
        cause: PowerError,
    },
    /// Sleep service call failed
    #[error("{call} failed: {cause}")]
    Sleep {
        /// Failing call
        call: HwCall,
        /// Platform error
        cause: SleepError,
    },
    /// Status LED pin write failed
    #[error("status LED write failed: {0}")]
    StatusLed(ErrorKind),
}

impl DemoError {
    /// The platform call that failed, if the error came from a service call.
    pub const fn call(&self) -> Option<HwCall> {
        match self {
            Self::Power { call, .. } | Self::Sleep { call, .. } => Some(*call),
            Self::StatusLed(_) => None,
        }
    }

    /// Tag a power-service error with its call.
    pub(crate) fn power(call: HwCall) -> impl FnOnce(PowerError) -> Self {
        move |cause| Self::Power { call, cause }
    }

    /// Tag a sleep-service error with its call.
    pub(crate) fn sleep(call: HwCall) -> impl FnOnce(SleepError) -> Self {
        move |cause| Self::Sleep { call, cause }
    }

    /// Convert a pin error.
    pub(crate) fn led<E: embedded_hal::digital::Error>(err: E) -> Self {
        Self::StatusLed(err.kind())
    }
}
