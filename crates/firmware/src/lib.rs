//! Power-management demo firmware
//!
//! Two demo runners built on the capability traits from the `platform` crate:
//!
//! - [`frequency`] - dynamic frequency scaling: report the power
//!   configuration, time a reconfiguration, dump the DFS locks, then sweep
//!   the CPU clock through fixed frequencies forever.
//! - [`sleep_modes`] - one build-time selected mode: stay active and blink
//!   the status LED, cycle through timer-woken light sleep, or enter deep
//!   sleep on a wake timer.
//!
//! # Architecture
//!
//! ```text
//! Emulator host (main.rs) | vendor binding
//!         ↓
//! Demo runners (frequency, sleep_modes)
//!         ↓
//! Capability traits (platform crate)
//! ```
//!
//! # Features
//!
//! - `emulator` - Desktop host: std clock, tracing output, process restart on deep sleep
//! - `std` - Enable standard library (for emulator and testing)
//! - `defmt` - `defmt::Format` derives on demo types
//!
//! # Build-time configuration
//!
//! ```bash
//! POWER_MODE=LIGHT_SLEEP_TIMER WAKE_TIMER_US=2000000 \
//!     cargo run -p firmware --features emulator -- sleep
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

#[macro_use]
mod log;

pub mod config;
pub mod error;
pub mod frequency;
pub mod sleep_modes;

#[cfg(feature = "emulator")]
pub mod emulator;

// Re-export key types
pub use config::{ModeSelection, PowerMode};
pub use error::{DemoError, HwCall};
pub use frequency::{run_frequency_sweep, FrequencySweep, ReconfigTiming, SweepReading};
pub use sleep_modes::{run_sleep_demo, SleepDemo};
