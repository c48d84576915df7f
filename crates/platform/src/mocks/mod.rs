//! Simulated platform for testing
//!
//! This module provides simulated implementations of all platform traits
//! for use in unit and integration tests and in the desktop emulator.
//!
//! All simulated components of one [`SimPlatform`] share a virtual clock
//! ([`SimTime`]) and an ordered event [`Journal`], so tests can assert both
//! *what* the demo code asked of the hardware and *when* it did so.

#![cfg(any(test, feature = "std"))]
// Mock counters and virtual time: overflow is not a concern in tests.
#![allow(clippy::arithmetic_side_effects)]

use core::convert::Infallible;
use core::fmt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use crate::power::write_lock_table;
use crate::*;

/// Shared virtual microsecond clock.
#[derive(Debug, Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    /// Start at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time (µs).
    pub fn now_us(&self) -> u64 {
        self.0.get()
    }

    /// Move virtual time forward by `us`.
    pub fn advance_us(&self, us: u64) {
        self.0.set(self.0.get().saturating_add(us));
    }
}

/// One observable interaction with the simulated hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    /// A configuration was accepted and is now active
    Configured {
        /// Virtual time after the reconfiguration cost was charged
        at_us: u64,
        /// The accepted configuration
        config: PowerConfig,
    },
    /// A configuration was rejected
    ConfigRejected {
        /// The rejected configuration
        config: PowerConfig,
        /// Reason for rejection
        error: PowerError,
    },
    /// The realized CPU frequency was read
    FrequencyRead {
        /// Value returned to the caller
        hz: u32,
    },
    /// The timer wake source was armed
    TimerWakeArmed {
        /// Requested wake delay
        duration_us: u64,
    },
    /// Light sleep began
    LightSleepEntered {
        /// Virtual entry time
        at_us: u64,
    },
    /// Light sleep ended
    LightSleepExited {
        /// Virtual wake time
        at_us: u64,
    },
    /// Deep sleep began; nothing from this program instance follows
    DeepSleepEntered {
        /// Virtual entry time
        at_us: u64,
        /// Armed timer wake delay, if any
        wake_after_us: Option<u64>,
    },
    /// A cooperative delay began
    Delay {
        /// Virtual start time
        at_us: u64,
        /// Requested duration
        ms: u32,
    },
    /// The status LED changed level
    Led {
        /// Virtual time of the write
        at_us: u64,
        /// `true` for high
        high: bool,
    },
    /// A log line was emitted
    Log {
        /// Severity
        level: LogLevel,
        /// Source tag
        tag: String,
        /// Formatted message
        message: String,
    },
}

/// Shared, ordered record of [`HwEvent`]s.
///
/// A [`Journal::disabled`] journal drops every event; long-running hosts use
/// it to keep memory bounded.
#[derive(Debug, Clone)]
pub struct Journal(Option<Rc<RefCell<Vec<HwEvent>>>>);

impl Journal {
    /// Recording journal.
    pub fn new() -> Self {
        Self(Some(Rc::default()))
    }

    /// Journal that discards events.
    pub fn disabled() -> Self {
        Self(None)
    }

    /// Append an event.
    pub fn record(&self, event: HwEvent) {
        if let Some(events) = &self.0 {
            events.borrow_mut().push(event);
        }
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<HwEvent> {
        self.0
            .as_ref()
            .map(|events| events.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |events| events.borrow().len())
    }

    /// `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages of all [`HwEvent::Log`] entries, in order.
    pub fn log_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HwEvent::Log { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// All events except log lines, in order.
    pub fn hardware_events(&self) -> Vec<HwEvent> {
        self.events()
            .into_iter()
            .filter(|event| !matches!(event, HwEvent::Log { .. }))
            .collect()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Power ───────────────────────────────────────────────────────────────────

/// Simulated power-management service.
///
/// Realized frequency follows a simple DFS model: while any CPU_FREQ_MAX lock
/// is active the CPU runs at `max_freq_mhz`, otherwise at `min_freq_mhz`.
pub struct SimPowerManager {
    limits: PlatformLimits,
    config: PowerConfig,
    locks: Vec<PmLock>,
    time: SimTime,
    journal: Journal,
    reconfigure_cost_us: u64,
    fail_next_configure: Option<PowerError>,
    fail_configuration_read: Option<PowerError>,
    fail_frequency_read: Option<PowerError>,
}

impl SimPowerManager {
    /// Default CPU frequency before the application configures DFS.
    pub const BOOT_FREQ_MHZ: u32 = 160;

    /// Virtual time charged per accepted configuration.
    pub const DEFAULT_RECONFIGURE_COST_US: u64 = 45;

    /// ESP32-like service: boot at 160 MHz fixed, `rtos0` CPU_FREQ_MAX held.
    pub fn new(time: SimTime, journal: Journal) -> Self {
        Self {
            limits: PlatformLimits::ESP32,
            config: PowerConfig::fixed(Self::BOOT_FREQ_MHZ),
            locks: Self::rtos_locks(),
            time,
            journal,
            reconfigure_cost_us: Self::DEFAULT_RECONFIGURE_COST_US,
            fail_next_configure: None,
            fail_configuration_read: None,
            fail_frequency_read: None,
        }
    }

    /// Idle-task locks of a dual-core RTOS: core 0 busy, core 1 idle.
    pub fn rtos_locks() -> Vec<PmLock> {
        std::vec![
            PmLock {
                name: "rtos0",
                kind: LockType::CpuFreqMax,
                arg: 0,
                active_count: 1,
            },
            PmLock {
                name: "rtos1",
                kind: LockType::CpuFreqMax,
                arg: 1,
                active_count: 0,
            },
        ]
    }

    /// Replace the lock table.
    pub fn with_locks(mut self, locks: Vec<PmLock>) -> Self {
        self.locks = locks;
        self
    }

    /// Replace the virtual time charged per accepted configuration.
    pub fn with_reconfigure_cost_us(mut self, cost_us: u64) -> Self {
        self.reconfigure_cost_us = cost_us;
        self
    }

    /// Make the next [`PowerManager::configure`] call fail with `error`.
    pub fn fail_next_configure(&mut self, error: PowerError) {
        self.fail_next_configure = Some(error);
    }

    /// Make every [`PowerManager::configuration`] call fail with `error`.
    pub fn fail_configuration_read(&mut self, error: PowerError) {
        self.fail_configuration_read = Some(error);
    }

    /// Make every [`PowerManager::cpu_frequency_hz`] call fail with `error`.
    pub fn fail_frequency_read(&mut self, error: PowerError) {
        self.fail_frequency_read = Some(error);
    }

    /// Set the acquisition count of the lock called `name`.
    ///
    /// Returns `false` if no such lock exists.
    pub fn set_lock_count(&mut self, name: &str, active_count: u32) -> bool {
        match self.locks.iter_mut().find(|lock| lock.name == name) {
            Some(lock) => {
                lock.active_count = active_count;
                true
            }
            None => false,
        }
    }

    /// Current lock table.
    pub fn locks(&self) -> &[PmLock] {
        &self.locks
    }

    fn cpu_pinned_to_max(&self) -> bool {
        self.locks
            .iter()
            .any(|lock| lock.kind == LockType::CpuFreqMax && lock.is_active())
    }
}

impl PowerManager for SimPowerManager {
    fn configuration(&self) -> Result<PowerConfig, PowerError> {
        match self.fail_configuration_read {
            Some(error) => Err(error),
            None => Ok(self.config),
        }
    }

    fn configure(&mut self, config: &PowerConfig) -> Result<(), PowerError> {
        let checked = match self.fail_next_configure.take() {
            Some(error) => Err(error),
            None => self.limits.check(config),
        };
        if let Err(error) = checked {
            self.journal.record(HwEvent::ConfigRejected {
                config: *config,
                error,
            });
            return Err(error);
        }

        self.time.advance_us(self.reconfigure_cost_us);
        self.config = *config;
        self.journal.record(HwEvent::Configured {
            at_us: self.time.now_us(),
            config: *config,
        });
        Ok(())
    }

    fn dump_locks(&self, out: &mut dyn fmt::Write) -> Result<(), PowerError> {
        write_lock_table(&self.locks, out)?;
        Ok(())
    }

    fn cpu_frequency_hz(&self) -> Result<u32, PowerError> {
        if let Some(error) = self.fail_frequency_read {
            return Err(error);
        }
        let mhz = if self.cpu_pinned_to_max() {
            self.config.max_freq_mhz
        } else {
            self.config.min_freq_mhz
        };
        let hz = mhz.saturating_mul(1_000_000);
        self.journal.record(HwEvent::FrequencyRead { hz });
        Ok(hz)
    }
}

// ─── Sleep ───────────────────────────────────────────────────────────────────

/// Simulated sleep controller.
///
/// Light sleep advances virtual time by the armed timer duration (plus a
/// configurable wake latency). Deep sleep records its entry and then never
/// resolves, standing in for the restart that follows a real wake.
pub struct SimSleep {
    time: SimTime,
    journal: Journal,
    armed_us: Option<u64>,
    wake_latency_us: u64,
    wake_cause: WakeCause,
    fail_arm: Option<SleepError>,
    fail_sleep: Option<SleepError>,
}

impl SimSleep {
    /// Controller with no wake source armed, reporting a power-on boot.
    pub fn new(time: SimTime, journal: Journal) -> Self {
        Self {
            time,
            journal,
            armed_us: None,
            wake_latency_us: 0,
            wake_cause: WakeCause::PowerOn,
            fail_arm: None,
            fail_sleep: None,
        }
    }

    /// Extra virtual time between the timer firing and execution resuming.
    pub fn with_wake_latency_us(mut self, latency_us: u64) -> Self {
        self.wake_latency_us = latency_us;
        self
    }

    /// Report `cause` from [`SleepController::wake_cause`].
    pub fn with_wake_cause(mut self, cause: WakeCause) -> Self {
        self.wake_cause = cause;
        self
    }

    /// Make every [`SleepController::enable_timer_wakeup`] call fail.
    pub fn fail_arm(&mut self, error: SleepError) {
        self.fail_arm = Some(error);
    }

    /// Make every light/deep sleep entry fail.
    pub fn fail_sleep(&mut self, error: SleepError) {
        self.fail_sleep = Some(error);
    }

    /// Currently armed timer duration.
    pub fn armed_us(&self) -> Option<u64> {
        self.armed_us
    }
}

impl SleepController for SimSleep {
    fn enable_timer_wakeup(&mut self, duration_us: u64) -> Result<(), SleepError> {
        if let Some(error) = self.fail_arm {
            return Err(error);
        }
        self.armed_us = Some(duration_us);
        self.journal.record(HwEvent::TimerWakeArmed { duration_us });
        Ok(())
    }

    async fn light_sleep(&mut self) -> Result<(), SleepError> {
        if let Some(error) = self.fail_sleep {
            return Err(error);
        }
        let armed_us = self.armed_us.ok_or(SleepError::NoWakeSource)?;

        self.journal.record(HwEvent::LightSleepEntered {
            at_us: self.time.now_us(),
        });
        self.time.advance_us(armed_us.saturating_add(self.wake_latency_us));
        self.journal.record(HwEvent::LightSleepExited {
            at_us: self.time.now_us(),
        });
        embassy_futures::yield_now().await;
        Ok(())
    }

    async fn deep_sleep(&mut self) -> Result<Infallible, SleepError> {
        if let Some(error) = self.fail_sleep {
            return Err(error);
        }
        self.journal.record(HwEvent::DeepSleepEntered {
            at_us: self.time.now_us(),
            wake_after_us: self.armed_us,
        });
        Ok(core::future::pending::<Infallible>().await)
    }

    fn wake_cause(&self) -> WakeCause {
        self.wake_cause
    }
}

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Simulated clock over [`SimTime`].
///
/// `delay_ms` advances virtual time instantly and yields once. With a halt
/// point set, the first delay starting at or after it never resolves, which
/// bounds the demos' unbounded loops in tests.
pub struct SimClock {
    time: SimTime,
    journal: Journal,
    halt_at_us: Option<u64>,
}

impl SimClock {
    /// Clock with no halt point.
    pub fn new(time: SimTime, journal: Journal) -> Self {
        Self {
            time,
            journal,
            halt_at_us: None,
        }
    }

    /// Stop the world at the first delay starting at or after `halt_at_us`.
    pub fn halt_at_us(mut self, halt_at_us: u64) -> Self {
        self.halt_at_us = Some(halt_at_us);
        self
    }

    /// `true` once the halt point has been reached.
    pub fn is_halted(&self) -> bool {
        self.halt_at_us
            .is_some_and(|halt_at_us| self.time.now_us() >= halt_at_us)
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.time.now_us()
    }

    async fn delay_ms(&mut self, ms: u32) {
        if self.is_halted() {
            core::future::pending::<()>().await;
        }
        self.journal.record(HwEvent::Delay {
            at_us: self.time.now_us(),
            ms,
        });
        self.time.advance_us(u64::from(ms) * 1_000);
        embassy_futures::yield_now().await;
    }
}

// ─── LED and log ─────────────────────────────────────────────────────────────

/// Status LED that journals every level change.
pub struct MockLed {
    time: SimTime,
    journal: Journal,
    high: bool,
}

impl MockLed {
    /// LED starting low.
    pub fn new(time: SimTime, journal: Journal) -> Self {
        Self {
            time,
            journal,
            high: false,
        }
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) {
        self.high = high;
        self.journal.record(HwEvent::Led {
            at_us: self.time.now_us(),
            high,
        });
    }
}

impl embedded_hal::digital::ErrorType for MockLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// [`LogSink`] that journals formatted lines.
pub struct RecordingLog {
    journal: Journal,
}

impl RecordingLog {
    /// Sink writing into `journal`.
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl LogSink for RecordingLog {
    fn log(&mut self, level: LogLevel, tag: &str, args: fmt::Arguments<'_>) {
        self.journal.record(HwEvent::Log {
            level,
            tag: tag.to_string(),
            message: std::fmt::format(args),
        });
    }
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Every simulated component wired to one [`SimTime`] and one [`Journal`].
pub struct SimPlatform {
    /// Shared virtual clock
    pub time: SimTime,
    /// Shared event journal
    pub journal: Journal,
    /// Power-management service
    pub power: SimPowerManager,
    /// Sleep controller
    pub sleep: SimSleep,
    /// Timing service
    pub clock: SimClock,
    /// Status LED
    pub led: MockLed,
    /// Log sink
    pub log: RecordingLog,
}

impl SimPlatform {
    /// ESP32-like platform with a recording journal.
    pub fn new() -> Self {
        let time = SimTime::new();
        let journal = Journal::new();
        Self {
            power: SimPowerManager::new(time.clone(), journal.clone()),
            sleep: SimSleep::new(time.clone(), journal.clone()),
            clock: SimClock::new(time.clone(), journal.clone()),
            led: MockLed::new(time.clone(), journal.clone()),
            log: RecordingLog::new(journal.clone()),
            time,
            journal,
        }
    }

    /// Same as [`new`](Self::new), with the clock halting at `halt_at_us`.
    pub fn halting_at(halt_at_us: u64) -> Self {
        let mut platform = Self::new();
        platform.clock =
            SimClock::new(platform.time.clone(), platform.journal.clone()).halt_at_us(halt_at_us);
        platform
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use embedded_hal::digital::OutputPin;

    #[test]
    fn test_boot_configuration() {
        let sim = SimPlatform::new();
        assert_eq!(
            sim.power.configuration().unwrap(),
            PowerConfig::fixed(SimPowerManager::BOOT_FREQ_MHZ)
        );
    }

    #[test]
    fn test_rtos_lock_pins_cpu_to_max() {
        let mut sim = SimPlatform::new();
        sim.power.configure(&PowerConfig::range(80, 240)).unwrap();
        assert_eq!(sim.power.cpu_frequency_hz().unwrap(), 240_000_000);

        assert!(sim.power.set_lock_count("rtos0", 0));
        assert_eq!(sim.power.cpu_frequency_hz().unwrap(), 80_000_000);
    }

    #[test]
    fn test_configure_charges_virtual_time() {
        let mut sim = SimPlatform::new();
        sim.power.configure(&PowerConfig::fixed(80)).unwrap();
        assert_eq!(sim.time.now_us(), SimPowerManager::DEFAULT_RECONFIGURE_COST_US);
        assert_eq!(
            sim.journal.events(),
            std::vec![HwEvent::Configured {
                at_us: SimPowerManager::DEFAULT_RECONFIGURE_COST_US,
                config: PowerConfig::fixed(80),
            }]
        );
    }

    #[test]
    fn test_rejected_configuration_keeps_previous() {
        let mut sim = SimPlatform::new();
        let err = sim.power.configure(&PowerConfig::range(240, 80)).unwrap_err();
        assert_eq!(err, PowerError::InvalidArgument);
        assert_eq!(sim.power.configuration().unwrap(), PowerConfig::fixed(160));
        assert_eq!(sim.time.now_us(), 0);
    }

    #[test]
    fn test_injected_configure_failure_is_one_shot() {
        let mut sim = SimPlatform::new();
        sim.power.fail_next_configure(PowerError::Driver(0x103));
        assert_eq!(
            sim.power.configure(&PowerConfig::fixed(80)),
            Err(PowerError::Driver(0x103))
        );
        assert_eq!(sim.power.configure(&PowerConfig::fixed(80)), Ok(()));
    }

    #[test]
    fn test_injected_configuration_read_failure_persists() {
        let mut sim = SimPlatform::new();
        sim.power.fail_configuration_read(PowerError::InvalidState);
        assert_eq!(sim.power.configuration(), Err(PowerError::InvalidState));
        assert_eq!(sim.power.configuration(), Err(PowerError::InvalidState));
        assert!(sim.journal.events().is_empty());
    }

    #[test]
    fn test_dump_locks_reports_rtos_locks() {
        let sim = SimPlatform::new();
        let mut out = String::new();
        sim.power.dump_locks(&mut out).unwrap();
        assert!(out.starts_with("Lock stats:"));
        assert!(out.contains("rtos0"));
        assert!(out.contains("rtos1"));
    }

    #[tokio::test]
    async fn test_light_sleep_advances_by_armed_duration() {
        let mut sim = SimPlatform::new();
        sim.sleep.enable_timer_wakeup(5_000_000).unwrap();
        sim.sleep.light_sleep().await.unwrap();
        assert_eq!(sim.time.now_us(), 5_000_000);

        let events = sim.journal.events();
        assert_eq!(events[1], HwEvent::LightSleepEntered { at_us: 0 });
        assert_eq!(events[2], HwEvent::LightSleepExited { at_us: 5_000_000 });
    }

    #[tokio::test]
    async fn test_light_sleep_without_wake_source_is_rejected() {
        let mut sim = SimPlatform::new();
        assert_eq!(sim.sleep.light_sleep().await, Err(SleepError::NoWakeSource));
        assert!(sim.journal.is_empty());
    }

    #[tokio::test]
    async fn test_deep_sleep_never_resolves() {
        let mut sim = SimPlatform::new();
        sim.sleep.enable_timer_wakeup(1_000).unwrap();
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            sim.sleep.deep_sleep(),
        )
        .await;
        assert!(outcome.is_err(), "deep sleep must not return on success");
        assert_eq!(
            sim.journal.events().last(),
            Some(&HwEvent::DeepSleepEntered {
                at_us: 0,
                wake_after_us: Some(1_000),
            })
        );
    }

    #[tokio::test]
    async fn test_deep_sleep_failure_is_returned() {
        let mut sim = SimPlatform::new();
        sim.sleep.fail_sleep(SleepError::Rejected);
        assert!(matches!(
            sim.sleep.deep_sleep().await,
            Err(SleepError::Rejected)
        ));
    }

    #[tokio::test]
    async fn test_clock_halts_at_halt_point() {
        let mut sim = SimPlatform::halting_at(2_000);
        sim.clock.delay_ms(1).await;
        sim.clock.delay_ms(1).await;
        assert!(sim.clock.is_halted());

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            sim.clock.delay_ms(1),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(sim.time.now_us(), 2_000);
    }

    #[test]
    fn test_led_and_log_are_journaled_in_order() {
        let mut sim = SimPlatform::new();
        sim.led.set_high().unwrap();
        sim.log.log(LogLevel::Info, "TEST", format_args!("n={}", 3));
        sim.led.set_low().unwrap();

        assert_eq!(
            sim.journal.events(),
            std::vec![
                HwEvent::Led { at_us: 0, high: true },
                HwEvent::Log {
                    level: LogLevel::Info,
                    tag: "TEST".to_string(),
                    message: "n=3".to_string(),
                },
                HwEvent::Led { at_us: 0, high: false },
            ]
        );
        assert!(!sim.led.is_high());
    }

    #[test]
    fn test_disabled_journal_records_nothing() {
        let journal = Journal::disabled();
        journal.record(HwEvent::FrequencyRead { hz: 1 });
        assert!(journal.is_empty());
    }
}
