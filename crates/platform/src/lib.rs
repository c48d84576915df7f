//! Hardware capability layer for the power-management demos
//!
//! This crate defines the contract the demo firmware relies on, as a set of
//! small capability traits, so the control logic can run against real
//! hardware bindings or against the simulated platform in [`mocks`].
//!
//! # Architecture Layers
//!
//! ```text
//! Demo runners (firmware crate: frequency sweep, sleep modes)
//!         ↓
//! Capability traits (this crate)
//!         ↓
//! Vendor power-management / sleep drivers  |  mocks (host simulation)
//! ```
//!
//! # Capabilities
//!
//! - [`PowerManager`] - power configuration, DFS lock report, CPU clock read-back
//! - [`SleepController`] - timer wake source, light sleep, deep sleep
//! - [`Clock`] - monotonic microsecond clock and cooperative delay
//! - [`LogSink`] - leveled, tagged log output
//! - Status LED: [`embedded_hal::digital::OutputPin`]
//!
//! # Features
//!
//! - `std`: simulated implementations in [`mocks`]
//! - `defmt`: `defmt::Format` derives and the `DefmtLog` sink
//!
//! # Example
//!
//! ```no_run
//! use platform::{PowerConfig, PowerManager};
//!
//! fn pin_to_160<P: PowerManager>(pm: &mut P) -> Result<u32, platform::PowerError> {
//!     pm.configure(&PowerConfig::fixed(160))?;
//!     pm.cpu_frequency_hz()
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // log through LogSink, not println! in lib code
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // single-threaded executors, Send bounds not needed

pub mod clock;
pub mod log;
pub mod mocks;
pub mod power;
pub mod sleep;

pub use clock::{Clock, EmbassyClock};
pub use log::{LogLevel, LogSink};
pub use power::{LockType, PlatformLimits, PmLock, PowerConfig, PowerError, PowerManager};
pub use sleep::{SleepController, SleepError, WakeCause};

#[cfg(feature = "defmt")]
pub use log::DefmtLog;
