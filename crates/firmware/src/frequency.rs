//! Dynamic frequency scaling demo
//!
//! Sequence:
//!
//! 1. Report the boot power configuration.
//! 2. Apply [`INITIAL_CONFIG`] and report how long the switch took.
//! 3. Dump the DFS lock table.
//! 4. Forever: pin the CPU to each of [`FREQUENCY_STEPS_MHZ`] in turn, read
//!    the realized frequency back and dwell for [`SWEEP_DWELL_MS`].
//!
//! Every platform failure ends the demo with a [`DemoError`].

use core::convert::Infallible;

use platform::{Clock, LogSink, PowerConfig, PowerManager};

use crate::config::{FREQUENCY_STEPS_MHZ, INITIAL_CONFIG, LOCK_REPORT_CAPACITY, SWEEP_DWELL_MS};
use crate::error::{DemoError, HwCall};

/// Log tag for this demo.
pub const TAG: &str = "PM_FREQ";

/// Duration of one timed reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconfigTiming {
    /// Monotonic time spent inside `configure`
    pub elapsed_us: u64,
}

impl ReconfigTiming {
    /// Elapsed time in milliseconds (for the two-decimal log figure).
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_us as f32 / 1000.0
    }
}

/// Outcome of one sweep step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReading {
    /// Frequency requested with a fixed configuration
    pub target_mhz: u32,
    /// Frequency the platform reports afterwards
    pub realized_mhz: u32,
}

impl SweepReading {
    /// `true` when the platform runs at the requested frequency.
    pub const fn matches(&self) -> bool {
        self.target_mhz == self.realized_mhz
    }
}

/// Frequency sweep runner over injected platform services.
pub struct FrequencySweep<P, C, L> {
    /// Power-management service
    pub power: P,
    /// Timing service
    pub clock: C,
    /// Log output
    pub log: L,
}

impl<P, C, L> FrequencySweep<P, C, L>
where
    P: PowerManager,
    C: Clock,
    L: LogSink,
{
    /// Bundle the services.
    pub fn new(power: P, clock: C, log: L) -> Self {
        Self { power, clock, log }
    }

    /// Run the whole demo. Only returns on failure.
    pub async fn run(&mut self) -> Result<Infallible, DemoError> {
        self.report_current_config("Default cfg:")?;

        let timing = self.apply_initial_config()?;
        self.report_current_config("After first cfg:")?;
        log_info!(
            self.log,
            TAG,
            "This reconfiguration took {}us, {:.2}ms.",
            timing.elapsed_us,
            timing.elapsed_ms()
        );

        self.report_locks()?;

        loop {
            self.sweep_cycle().await?;
        }
    }

    /// Read the active configuration and log it under `heading`.
    pub fn report_current_config(&mut self, heading: &str) -> Result<PowerConfig, DemoError> {
        let config = self
            .power
            .configuration()
            .map_err(DemoError::power(HwCall::GetConfiguration))?;

        log_info!(self.log, TAG, "{}", heading);
        log_info!(self.log, TAG, "  min_freq_mhz = {}", config.min_freq_mhz);
        log_info!(self.log, TAG, "  max_freq_mhz = {}", config.max_freq_mhz);
        log_info!(
            self.log,
            TAG,
            "  light_sleep_enable = {}",
            config.light_sleep_label()
        );
        Ok(config)
    }

    /// Apply [`INITIAL_CONFIG`], timing only the `configure` call.
    pub fn apply_initial_config(&mut self) -> Result<ReconfigTiming, DemoError> {
        let start_us = self.clock.now_us();
        self.power
            .configure(&INITIAL_CONFIG)
            .map_err(DemoError::power(HwCall::Configure))?;
        Ok(ReconfigTiming {
            elapsed_us: self.clock.elapsed_us(start_us),
        })
    }

    /// Log the DFS lock table line by line, followed by a note on the
    /// effect of an active `CPU_FREQ_MAX` lock.
    pub fn report_locks(&mut self) -> Result<(), DemoError> {
        let mut report: heapless::String<LOCK_REPORT_CAPACITY> = heapless::String::new();
        self.power
            .dump_locks(&mut report)
            .map_err(DemoError::power(HwCall::DumpLocks))?;

        for line in report.lines().filter(|line| !line.trim().is_empty()) {
            log_info!(self.log, TAG, "{}", line);
        }
        log_info!(
            self.log,
            TAG,
            "While a CPU_FREQ_MAX lock is held (rtos0 on the running core) \
             the CPU runs at max_freq_mhz."
        );
        Ok(())
    }

    /// Pin the CPU to `target_mhz`, read the result back and dwell.
    pub async fn sweep_step(&mut self, target_mhz: u32) -> Result<SweepReading, DemoError> {
        let config = PowerConfig::fixed(target_mhz);
        self.power
            .configure(&config)
            .map_err(DemoError::power(HwCall::Configure))?;

        let hz = self
            .power
            .cpu_frequency_hz()
            .map_err(DemoError::power(HwCall::ReadCpuFrequency))?;
        let reading = SweepReading {
            target_mhz,
            realized_mhz: hz / 1_000_000,
        };

        log_info!(
            self.log,
            TAG,
            "Frequency after cfg [{}-{}]: {}MHz",
            config.min_freq_mhz,
            config.max_freq_mhz,
            reading.realized_mhz
        );
        if !reading.matches() {
            log_warn!(
                self.log,
                TAG,
                "Requested {}MHz but the CPU runs at {}MHz",
                reading.target_mhz,
                reading.realized_mhz
            );
        }

        self.clock.delay_ms(SWEEP_DWELL_MS).await;
        Ok(reading)
    }

    /// One pass over [`FREQUENCY_STEPS_MHZ`].
    pub async fn sweep_cycle(&mut self) -> Result<(), DemoError> {
        for target_mhz in FREQUENCY_STEPS_MHZ {
            self.sweep_step(target_mhz).await?;
        }
        Ok(())
    }
}

/// Run the frequency sweep demo. Only returns on failure.
pub async fn run_frequency_sweep<P, C, L>(
    power: P,
    clock: C,
    log: L,
) -> Result<Infallible, DemoError>
where
    P: PowerManager,
    C: Clock,
    L: LogSink,
{
    FrequencySweep::new(power, clock, log).run().await
}
