use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::Step;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking power demo builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // The capability layer must stay no_std: no std, no host deps.
    Step::new(
        "Platform crate (no_std, thumbv7em-none-eabihf)",
        &[
            "check",
            "-p",
            "platform",
            "--target",
            "thumbv7em-none-eabihf",
            "--no-default-features",
        ],
    )
    .run()?;

    Step::new(
        "Firmware library (no_std, thumbv7em-none-eabihf)",
        &[
            "check",
            "-p",
            "firmware",
            "--lib",
            "--target",
            "thumbv7em-none-eabihf",
        ],
    )
    .run()?;

    Step::new(
        "Emulator target (host)",
        &["check", "-p", "firmware", "--features", "emulator"],
    )
    .run()?;

    // Every mode must build; an unknown name is a valid build too.
    for mode in ["ACTIVE", "LIGHT_SLEEP_TIMER", "DEEP_SLEEP_TIMER", "UNKNOWN"] {
        let label = format!("Emulator with POWER_MODE={mode}");
        Step::new(&label, &["check", "-p", "firmware", "--features", "emulator"])
            .with_env(&[("POWER_MODE", mode)])
            .run()?;
    }

    Step::new(
        "Clippy lints",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--features",
            "firmware/emulator",
            "--",
            "-D",
            "warnings",
        ],
    )
    .warn_only()
    .run()?;

    Step::new("Formatting", &["fmt", "--all", "--check"])
        .warn_only()
        .run()?;

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
