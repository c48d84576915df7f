//! Frequency sweep integration tests
//!
//! Drive the complete frequency demo against the simulated platform. The
//! demo never returns on success, so each run is bounded by the simulated
//! clock's halt point and a short real-time timeout.
//!
//! Run with: cargo test -p firmware --test integration_frequency
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::time::Duration;

use firmware::config::{FREQUENCY_STEPS_MHZ, INITIAL_CONFIG, SWEEP_DWELL_MS};
use firmware::{run_frequency_sweep, DemoError, FrequencySweep, HwCall};
use platform::mocks::{HwEvent, SimPlatform, SimPowerManager};
use platform::{LockType, LogLevel, PmLock, PowerConfig, PowerError, PowerManager};

const RUN_TIMEOUT: Duration = Duration::from_millis(200);

/// Enough virtual time for four full sweep steps.
const FOUR_STEPS_US: u64 = 4 * SWEEP_DWELL_MS as u64 * 1_000 - 1;

fn sweep_lines(messages: &[String]) -> Vec<&str> {
    messages
        .iter()
        .map(String::as_str)
        .filter(|m| m.starts_with("Frequency after cfg"))
        .collect()
}

#[tokio::test]
async fn test_demo_reports_then_sweeps_in_order() {
    let sim = SimPlatform::halting_at(FOUR_STEPS_US);
    let journal = sim.journal.clone();

    let outcome = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await;
    assert!(outcome.is_err(), "sweep must run until halted");

    let messages = journal.log_messages();
    assert_eq!(
        &messages[..8],
        &[
            "Default cfg:",
            "  min_freq_mhz = 160",
            "  max_freq_mhz = 160",
            "  light_sleep_enable = FALSE",
            "After first cfg:",
            "  min_freq_mhz = 80",
            "  max_freq_mhz = 240",
            "  light_sleep_enable = FALSE",
        ]
    );
    assert!(messages[8].starts_with("This reconfiguration took 45us, 0.0"));
    assert!(messages[8].ends_with("ms."));
    assert_eq!(messages[9], "Lock stats:");

    let sweeps = sweep_lines(&messages);
    assert_eq!(
        &sweeps[..4],
        &[
            "Frequency after cfg [80-80]: 80MHz",
            "Frequency after cfg [160-160]: 160MHz",
            "Frequency after cfg [240-240]: 240MHz",
            "Frequency after cfg [80-80]: 80MHz",
        ]
    );
}

#[tokio::test]
async fn test_configurations_applied_in_sequence() {
    let sim = SimPlatform::halting_at(FOUR_STEPS_US);
    let journal = sim.journal.clone();

    let _ = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await;

    let applied: Vec<PowerConfig> = journal
        .events()
        .into_iter()
        .filter_map(|event| match event {
            HwEvent::Configured { config, .. } => Some(config),
            _ => None,
        })
        .collect();

    assert_eq!(applied[0], INITIAL_CONFIG);
    let expected = FREQUENCY_STEPS_MHZ.iter().cycle().map(|&mhz| PowerConfig::fixed(mhz));
    for (got, want) in applied[1..].iter().zip(expected) {
        assert_eq!(*got, want);
    }
    assert!(applied.len() >= 5);
}

#[tokio::test]
async fn test_each_step_dwells_two_seconds() {
    let sim = SimPlatform::halting_at(FOUR_STEPS_US);
    let journal = sim.journal.clone();

    let _ = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await;

    let reads_then_delays: Vec<HwEvent> = journal
        .hardware_events()
        .into_iter()
        .filter(|e| matches!(e, HwEvent::FrequencyRead { .. } | HwEvent::Delay { .. }))
        .collect();
    for pair in reads_then_delays.chunks(2).take(4) {
        assert!(matches!(pair[0], HwEvent::FrequencyRead { .. }));
        assert!(matches!(pair[1], HwEvent::Delay { ms: SWEEP_DWELL_MS, .. }));
    }
}

#[tokio::test]
async fn test_fixed_steps_read_back_without_rtos_lock() {
    let mut sim = SimPlatform::new();
    assert!(sim.power.set_lock_count("rtos0", 0));
    let mut demo = FrequencySweep::new(sim.power, sim.clock, sim.log);

    for mhz in FREQUENCY_STEPS_MHZ {
        let reading = demo.sweep_step(mhz).await.unwrap();
        assert_eq!(reading.realized_mhz, mhz);
        assert!(reading.matches());
    }
}

#[tokio::test]
async fn test_initial_config_timing_matches_reconfigure_cost() {
    let sim = SimPlatform::new();
    let power = sim.power.with_reconfigure_cost_us(870);
    let mut demo = FrequencySweep::new(power, sim.clock, sim.log);

    let timing = demo.apply_initial_config().unwrap();

    assert_eq!(timing.elapsed_us, 870);
}

#[tokio::test]
async fn test_rejected_initial_config_is_fatal() {
    let mut sim = SimPlatform::new();
    sim.power.fail_next_configure(PowerError::InvalidArgument);
    let journal = sim.journal.clone();

    let err = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await
    .expect("a rejected configuration must end the demo")
    .unwrap_err();

    assert_eq!(
        err,
        DemoError::Power {
            call: HwCall::Configure,
            cause: PowerError::InvalidArgument
        }
    );
    let messages = journal.log_messages();
    assert!(messages.iter().any(|m| m == "Default cfg:"));
    assert!(!messages.iter().any(|m| m == "After first cfg:"));
}

#[tokio::test]
async fn test_frequency_read_failure_is_fatal() {
    let mut sim = SimPlatform::new();
    sim.power.fail_frequency_read(PowerError::Driver(-3));

    let err = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await
    .expect("a failed read must end the demo")
    .unwrap_err();

    assert_eq!(err.call(), Some(HwCall::ReadCpuFrequency));
}

#[tokio::test]
async fn test_configuration_read_failure_is_fatal() {
    let mut sim = SimPlatform::new();
    sim.power.fail_configuration_read(PowerError::InvalidState);
    let journal = sim.journal.clone();

    let err = tokio::time::timeout(
        RUN_TIMEOUT,
        run_frequency_sweep(sim.power, sim.clock, sim.log),
    )
    .await
    .expect("a failed configuration read must end the demo")
    .unwrap_err();

    assert_eq!(
        err,
        DemoError::Power {
            call: HwCall::GetConfiguration,
            cause: PowerError::InvalidState
        }
    );
    assert!(!journal
        .events()
        .iter()
        .any(|e| matches!(e, HwEvent::Configured { .. })));
    assert!(!journal.log_messages().iter().any(|m| m == "Default cfg:"));
}

#[tokio::test]
async fn test_oversized_lock_report_is_fatal() {
    let sim = SimPlatform::new();
    let locks = (0..16)
        .map(|core| PmLock {
            name: "very_long_lock_nm",
            kind: LockType::NoLightSleep,
            arg: core,
            active_count: 1,
        })
        .collect();
    let power = sim.power.with_locks(locks);
    let mut demo = FrequencySweep::new(power, sim.clock, sim.log);

    let err = demo.report_locks().unwrap_err();

    assert_eq!(
        err,
        DemoError::Power {
            call: HwCall::DumpLocks,
            cause: PowerError::ReportOverflow
        }
    );
}

/// Reports half of whatever the wrapped service would.
struct HalfSpeed(SimPowerManager);

impl PowerManager for HalfSpeed {
    fn configuration(&self) -> Result<PowerConfig, PowerError> {
        self.0.configuration()
    }

    fn configure(&mut self, config: &PowerConfig) -> Result<(), PowerError> {
        self.0.configure(config)
    }

    fn dump_locks(&self, out: &mut dyn core::fmt::Write) -> Result<(), PowerError> {
        self.0.dump_locks(out)
    }

    fn cpu_frequency_hz(&self) -> Result<u32, PowerError> {
        self.0.cpu_frequency_hz().map(|hz| hz / 2)
    }
}

#[tokio::test]
async fn test_mismatched_readback_warns_but_continues() {
    let sim = SimPlatform::new();
    let journal = sim.journal.clone();
    let mut demo = FrequencySweep::new(HalfSpeed(sim.power), sim.clock, sim.log);

    let reading = demo.sweep_step(240).await.unwrap();

    assert_eq!(reading.realized_mhz, 120);
    assert!(!reading.matches());
    let warnings: Vec<HwEvent> = journal
        .events()
        .into_iter()
        .filter(|e| matches!(e, HwEvent::Log { level: LogLevel::Warn, .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    // the step still dwells
    assert!(matches!(
        journal.hardware_events().last(),
        Some(HwEvent::Delay { ms: SWEEP_DWELL_MS, .. })
    ));
}
