//! xtask run - build and run a demo on the desktop emulator
//!
//! `POWER_MODE` and `WAKE_TIMER_US` are build-time inputs of the firmware
//! crate, so they are passed to cargo rather than to the emulator binary.
//! Changing either forces the firmware crate to rebuild.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::process::Command;

/// Sleep modes the firmware recognizes.
const KNOWN_MODES: &[&str] = &["ACTIVE", "LIGHT_SLEEP_TIMER", "DEEP_SLEEP_TIMER"];

#[derive(Subcommand, Clone, Copy)]
pub enum Demo {
    /// Dynamic frequency scaling sweep
    Frequency,
    /// Build-time selected sleep mode
    Sleep,
}

impl Demo {
    fn arg(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Sleep => "sleep",
        }
    }
}

pub fn run(demo: Demo, mode: Option<&str>, wake_us: Option<u64>, log: &str) -> Result<()> {
    println!();
    println!("{}", format!("▶ Running {} demo on the emulator", demo.arg()).cyan().bold());

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "-p",
        "firmware",
        "--features",
        "emulator",
        "--",
        demo.arg(),
    ])
    .env("RUST_LOG", log);

    if let Some(mode) = mode {
        if !KNOWN_MODES.contains(&mode) {
            println!(
                "{}",
                format!(
                    "  ⚠ POWER_MODE={mode} is not one of {}; the sleep demo will report it and exit",
                    KNOWN_MODES.join(", ")
                )
                .yellow()
            );
        }
        println!("{}", format!("  POWER_MODE={mode}").dimmed());
        cmd.env("POWER_MODE", mode);
    }
    if let Some(wake_us) = wake_us {
        anyhow::ensure!(wake_us > 0, "--wake-us must be greater than zero");
        println!("{}", format!("  WAKE_TIMER_US={wake_us}").dimmed());
        cmd.env("WAKE_TIMER_US", wake_us.to_string());
    }
    println!();

    let status = cmd.status().context("Failed to launch the emulator")?;
    if !status.success() {
        anyhow::bail!("Emulator exited with {status}");
    }
    Ok(())
}
