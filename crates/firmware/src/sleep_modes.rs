//! Sleep modes demo
//!
//! Runs the single [`PowerMode`] chosen at build time:
//!
//! - `ACTIVE`: pulse the status LED once a second, forever.
//! - `LIGHT_SLEEP_TIMER`: pulse, then light sleep until the wake timer
//!   fires; execution resumes in place and the cycle repeats.
//! - `DEEP_SLEEP_TIMER`: arm the wake timer and enter deep sleep. The wake
//!   restarts the program, so the demo never observes it.
//!
//! An unrecognized mode name is reported and the demo returns without
//! touching any hardware.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use platform::{Clock, LogSink, SleepController};

use crate::config::{
    ModeSelection, PowerMode, PULSE_HIGH_MS, PULSE_IDLE_MS, VALID_MODE_NAMES, WAKE_TIMER_US,
};
use crate::error::{DemoError, HwCall};

/// Log tag for this demo.
pub const TAG: &str = "PM_DEMO";

/// Sleep demo runner over injected platform services.
pub struct SleepDemo<S, C, L, P> {
    /// Sleep controller
    pub sleep: S,
    /// Timing service
    pub clock: C,
    /// Log output
    pub log: L,
    /// Status LED
    pub led: P,
    wake_us: u64,
}

impl<S, C, L, P> SleepDemo<S, C, L, P>
where
    S: SleepController,
    C: Clock,
    L: LogSink,
    P: OutputPin,
{
    /// Bundle the services, using the build-time wake timer.
    pub fn new(sleep: S, clock: C, log: L, led: P) -> Self {
        Self {
            sleep,
            clock,
            log,
            led,
            wake_us: WAKE_TIMER_US,
        }
    }

    /// Override the wake timer duration.
    pub fn with_wake_us(mut self, wake_us: u64) -> Self {
        self.wake_us = wake_us;
        self
    }

    /// Wake timer duration in use.
    pub fn wake_us(&self) -> u64 {
        self.wake_us
    }

    /// Run `selection`.
    ///
    /// Recognized modes never return `Ok`; `Ok(())` means the mode name was
    /// not recognized and was reported.
    pub async fn run(&mut self, selection: ModeSelection<'_>) -> Result<(), DemoError> {
        let mode = match selection {
            ModeSelection::Mode(mode) => mode,
            ModeSelection::Unrecognized(name) => {
                self.report_unknown_mode(name);
                return Ok(());
            }
        };

        log_debug!(
            self.log,
            TAG,
            "{} (wake cause: {})",
            mode,
            self.sleep.wake_cause().label()
        );

        match mode {
            PowerMode::Active => match self.stay_active().await? {},
            PowerMode::LightSleepTimer => match self.light_sleep_loop().await? {},
            PowerMode::DeepSleepTimer => match self.enter_deep_sleep().await? {},
        }
    }

    /// One LED pulse: high for [`PULSE_HIGH_MS`], then low.
    pub async fn blink_once(&mut self) -> Result<(), DemoError> {
        self.led.set_high().map_err(DemoError::led)?;
        self.clock.delay_ms(PULSE_HIGH_MS).await;
        self.led.set_low().map_err(DemoError::led)?;
        Ok(())
    }

    /// ACTIVE: pulse, idle, repeat.
    pub async fn stay_active(&mut self) -> Result<Infallible, DemoError> {
        log_info!(self.log, TAG, "ACTIVE");
        loop {
            self.blink_once().await?;
            self.clock.delay_ms(PULSE_IDLE_MS).await;
        }
    }

    /// One light sleep on the wake timer. Returns the time spent asleep.
    pub async fn light_sleep_cycle(&mut self) -> Result<u64, DemoError> {
        log_info!(self.log, TAG, "LIGHT_SLEEP: {}s", self.wake_us / 1_000_000);
        self.sleep
            .enable_timer_wakeup(self.wake_us)
            .map_err(DemoError::sleep(HwCall::EnableTimerWakeup))?;

        let start_us = self.clock.now_us();
        self.sleep
            .light_sleep()
            .await
            .map_err(DemoError::sleep(HwCall::LightSleep))?;
        let slept_us = self.clock.elapsed_us(start_us);

        log_info!(self.log, TAG, "Woke up from light sleep.");
        log_debug!(self.log, TAG, "asleep for {}us", slept_us);
        Ok(slept_us)
    }

    /// LIGHT_SLEEP_TIMER: pulse, light sleep, repeat.
    pub async fn light_sleep_loop(&mut self) -> Result<Infallible, DemoError> {
        loop {
            self.blink_once().await?;
            self.light_sleep_cycle().await?;
        }
    }

    /// DEEP_SLEEP_TIMER: arm the wake timer and enter deep sleep.
    ///
    /// Resolves only if the platform refuses the request.
    pub async fn enter_deep_sleep(&mut self) -> Result<Infallible, DemoError> {
        log_info!(self.log, TAG, "DEEP_SLEEP: {}s.", self.wake_us / 1_000_000);
        self.sleep
            .enable_timer_wakeup(self.wake_us)
            .map_err(DemoError::sleep(HwCall::EnableTimerWakeup))?;
        self.sleep
            .deep_sleep()
            .await
            .map_err(DemoError::sleep(HwCall::DeepSleep))
    }

    fn report_unknown_mode(&mut self, name: &str) {
        log_error!(
            self.log,
            TAG,
            "POWER_MODE \"{}\" unknown. Use: {}",
            name,
            VALID_MODE_NAMES
        );
    }
}

/// Run the sleep demo for `selection` with a `wake_us` timer.
pub async fn run_sleep_demo<S, C, L, P>(
    selection: ModeSelection<'_>,
    wake_us: u64,
    sleep: S,
    clock: C,
    log: L,
    led: P,
) -> Result<(), DemoError>
where
    S: SleepController,
    C: Clock,
    L: LogSink,
    P: OutputPin,
{
    SleepDemo::new(sleep, clock, log, led)
        .with_wake_us(wake_us)
        .run(selection)
        .await
}
