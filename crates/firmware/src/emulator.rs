//! Desktop emulator bindings
//!
//! Host implementations of the services the demos need that the simulated
//! platform does not model in real time: sleep states, the status LED and
//! log output. Timing uses [`platform::EmbassyClock`] on the embassy-time
//! `std` driver; power management uses [`platform::mocks::SimPowerManager`].

use core::convert::Infallible;
use core::fmt;
use std::ffi::OsString;
use std::io;
use std::process::Command;

use platform::mocks::{Journal, SimPowerManager, SimTime};
use platform::{LogLevel, LogSink, SleepController, SleepError, WakeCause};
use tokio::time::Duration;

use crate::config::LED_GPIO;

/// Environment variable carrying the number of deep-sleep restarts so far.
pub const BOOT_COUNT_ENV: &str = "DEMO_BOOT_COUNT";

/// Power manager for the emulator: the simulated ESP32 model with event
/// recording off.
pub fn host_power_manager() -> SimPowerManager {
    SimPowerManager::new(SimTime::new(), Journal::disabled())
}

/// Sleep controller for the emulator.
///
/// Light sleep waits out the armed timer in real time and resumes. Deep
/// sleep waits out the armed timer and then replaces the process with a
/// fresh copy of itself, so everything in memory is lost as on hardware.
#[derive(Debug)]
pub struct HostSleep {
    armed_us: Option<u64>,
    boot_count: u32,
}

impl HostSleep {
    /// Controller for this process instance; reads [`BOOT_COUNT_ENV`].
    pub fn from_env() -> Self {
        let boot_count = std::env::var(BOOT_COUNT_ENV)
            .ok()
            .and_then(|count| count.parse().ok())
            .unwrap_or(0);
        Self::with_boot_count(boot_count)
    }

    /// Controller reporting `boot_count` previous deep-sleep restarts.
    pub fn with_boot_count(boot_count: u32) -> Self {
        Self {
            armed_us: None,
            boot_count,
        }
    }

    /// Deep-sleep restarts before this process instance.
    pub fn boot_count(&self) -> u32 {
        self.boot_count
    }

    async fn wait_for_timer(&self) -> Result<(), SleepError> {
        let armed_us = self.armed_us.ok_or(SleepError::NoWakeSource)?;
        tokio::time::sleep(Duration::from_micros(armed_us)).await;
        Ok(())
    }

    fn restart(&self) -> Result<Infallible, SleepError> {
        let exe = std::env::current_exe().map_err(driver_error)?;
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();
        let mut command = Command::new(exe);
        command
            .args(args)
            .env(BOOT_COUNT_ENV, self.boot_count.saturating_add(1).to_string());
        tracing::debug!(boot = self.boot_count, "Emulator: restarting after deep sleep");
        relaunch(&mut command)
    }
}

#[cfg(unix)]
fn relaunch(command: &mut Command) -> Result<Infallible, SleepError> {
    use std::os::unix::process::CommandExt;
    // exec only returns on failure
    Err(driver_error(command.exec()))
}

#[cfg(not(unix))]
fn relaunch(command: &mut Command) -> Result<Infallible, SleepError> {
    let status = command.status().map_err(driver_error)?;
    std::process::exit(status.code().unwrap_or(1))
}

fn driver_error(err: io::Error) -> SleepError {
    SleepError::Driver(err.raw_os_error().unwrap_or(-1))
}

impl SleepController for HostSleep {
    fn enable_timer_wakeup(&mut self, duration_us: u64) -> Result<(), SleepError> {
        if duration_us == 0 {
            return Err(SleepError::InvalidArgument);
        }
        self.armed_us = Some(duration_us);
        Ok(())
    }

    async fn light_sleep(&mut self) -> Result<(), SleepError> {
        tracing::debug!(us = self.armed_us.unwrap_or(0), "Emulator: entering light sleep");
        self.wait_for_timer().await
    }

    async fn deep_sleep(&mut self) -> Result<Infallible, SleepError> {
        tracing::debug!(us = self.armed_us.unwrap_or(0), "Emulator: entering deep sleep");
        self.wait_for_timer().await?;
        self.restart()
    }

    fn wake_cause(&self) -> WakeCause {
        if self.boot_count == 0 {
            WakeCause::PowerOn
        } else {
            WakeCause::Timer
        }
    }
}

/// Status LED that reports level changes through tracing.
#[derive(Debug, Default)]
pub struct LoggingLed {
    high: bool,
}

impl LoggingLed {
    /// LED starting low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl embedded_hal::digital::ErrorType for LoggingLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for LoggingLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        tracing::trace!(gpio = LED_GPIO, "LED off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        tracing::trace!(gpio = LED_GPIO, "LED on");
        Ok(())
    }
}

/// [`LogSink`] forwarding to the tracing subscriber, tag as a field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&mut self, level: LogLevel, tag: &str, args: fmt::Arguments<'_>) {
        match level {
            LogLevel::Debug => tracing::debug!(tag, "{}", args),
            LogLevel::Info => tracing::info!(tag, "{}", args),
            LogLevel::Warn => tracing::warn!(tag, "{}", args),
            LogLevel::Error => tracing::error!(tag, "{}", args),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_hal::digital::OutputPin;

    #[test]
    fn wake_cause_follows_boot_count() {
        assert_eq!(HostSleep::with_boot_count(0).wake_cause(), WakeCause::PowerOn);
        assert_eq!(HostSleep::with_boot_count(3).wake_cause(), WakeCause::Timer);
    }

    #[test]
    fn zero_wake_timer_is_rejected() {
        let mut sleep = HostSleep::with_boot_count(0);
        assert_eq!(
            sleep.enable_timer_wakeup(0),
            Err(SleepError::InvalidArgument)
        );
    }

    #[tokio::test]
    async fn light_sleep_without_timer_is_refused() {
        let mut sleep = HostSleep::with_boot_count(0);
        assert_eq!(sleep.light_sleep().await, Err(SleepError::NoWakeSource));
    }

    #[tokio::test]
    async fn light_sleep_waits_for_the_armed_timer() {
        let mut sleep = HostSleep::with_boot_count(0);
        sleep.enable_timer_wakeup(20_000).unwrap();

        let start = tokio::time::Instant::now();
        sleep.light_sleep().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn led_tracks_level() {
        let mut led = LoggingLed::new();
        led.set_high().unwrap();
        assert!(led.is_high());
        led.set_low().unwrap();
        assert!(!led.is_high());
    }
}
