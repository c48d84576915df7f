//! Sleep and wake-source abstraction
//!
//! Light sleep keeps the execution context and resumes at the call site.
//! Deep sleep does not: a wake restarts the program from its entry point,
//! which is why [`SleepController::deep_sleep`] can only ever return an error.

use core::convert::Infallible;

/// Sleep control interface
pub trait SleepController {
    /// Arm the timer wake source to fire `duration_us` after sleep entry.
    ///
    /// The source stays armed for every subsequent sleep until re-armed.
    fn enable_timer_wakeup(&mut self, duration_us: u64) -> Result<(), SleepError>;

    /// Enter light sleep; resolves once a wake source fires.
    fn light_sleep(&mut self) -> impl core::future::Future<Output = Result<(), SleepError>>;

    /// Enter deep sleep.
    ///
    /// Never resolves on success: the wake event restarts the whole program.
    /// Resolves only if the platform refuses to enter deep sleep.
    fn deep_sleep(&mut self) -> impl core::future::Future<Output = Result<Infallible, SleepError>>;

    /// Reason the program is running: first power-on or a timer wake from deep sleep.
    fn wake_cause(&self) -> WakeCause;
}

/// What started the current program instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// Power-on or external reset; not a wake from sleep
    PowerOn,
    /// Timer wake source fired
    Timer,
}

impl WakeCause {
    /// Short label used in logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PowerOn => "power-on",
            Self::Timer => "timer",
        }
    }
}

/// Sleep service failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepError {
    /// Sleep requested with no wake source armed
    #[error("no wake source armed")]
    NoWakeSource,
    /// Wake duration outside the timer's range
    #[error("invalid argument")]
    InvalidArgument,
    /// Hardware refused sleep entry (e.g. a pending wake event)
    #[error("sleep rejected")]
    Rejected,
    /// Vendor driver error code
    #[error("driver error {0}")]
    Driver(i32),
}
