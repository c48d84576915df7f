// Build scripts report misconfiguration by failing the build.
#![allow(clippy::panic)]

use std::env;

/// Sleep demo mode when `POWER_MODE` is not set.
const DEFAULT_POWER_MODE: &str = "DEEP_SLEEP_TIMER";

/// Wake timer when `WAKE_TIMER_US` is not set (5 s).
const DEFAULT_WAKE_TIMER_US: u64 = 5_000_000;

const KNOWN_POWER_MODES: &[&str] = &["ACTIVE", "LIGHT_SLEEP_TIMER", "DEEP_SLEEP_TIMER"];

fn main() {
    println!("cargo:rerun-if-env-changed=POWER_MODE");
    println!("cargo:rerun-if-env-changed=WAKE_TIMER_US");
    println!("cargo:rerun-if-changed=build.rs");

    // The mode is passed through verbatim: an unknown name is a valid build
    // that makes the sleep demo report the valid set and return.
    let mode = env::var("POWER_MODE").unwrap_or_else(|_| DEFAULT_POWER_MODE.to_string());
    let mode = mode.trim();
    if !KNOWN_POWER_MODES.contains(&mode) {
        println!(
            "cargo:warning=POWER_MODE={mode} is not one of {}; the sleep demo will report it and return",
            KNOWN_POWER_MODES.join(", ")
        );
    }
    println!("cargo:rustc-env=DEMO_POWER_MODE={mode}");

    let wake_us = match env::var("WAKE_TIMER_US") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(us) if us > 0 => us,
            _ => panic!(
                "WAKE_TIMER_US must be a positive decimal number of microseconds, got {raw:?}"
            ),
        },
        Err(_) => DEFAULT_WAKE_TIMER_US,
    };
    println!("cargo:rustc-env=DEMO_WAKE_TIMER_US={wake_us}");
}
