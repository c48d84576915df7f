//! Demo configuration
//!
//! Everything here is fixed at build time. `build.rs` captures the
//! `POWER_MODE` and `WAKE_TIMER_US` environment variables; the remaining
//! constants are the demos' hardware choices.

use core::fmt;

use platform::PowerConfig;

/// Sleep demo mode as selected at build time (verbatim, trimmed).
pub const POWER_MODE_NAME: &str = env!("DEMO_POWER_MODE");

/// Wake timer when `WAKE_TIMER_US` is not set (5 s).
pub const DEFAULT_WAKE_TIMER_US: u64 = 5_000_000;

/// Wake timer duration in microseconds.
///
/// `build.rs` rejects anything but a positive decimal, so the fallback only
/// guards against the constant being compiled without the build script.
pub const WAKE_TIMER_US: u64 = match parse_decimal_u64(env!("DEMO_WAKE_TIMER_US")) {
    Some(us) if us > 0 => us,
    _ => DEFAULT_WAKE_TIMER_US,
};

/// Valid `POWER_MODE` names, as reported when the selection is unknown.
pub const VALID_MODE_NAMES: &str = "ACTIVE, LIGHT_SLEEP_TIMER, DEEP_SLEEP_TIMER";

// --- Frequency sweep ---

/// Initial dynamic range applied (and timed) before the sweep starts.
pub const INITIAL_CONFIG: PowerConfig = PowerConfig::range(80, 240);

/// Fixed frequencies visited by the sweep, in order.
pub const FREQUENCY_STEPS_MHZ: [u32; 3] = [80, 160, 240];

/// Time spent at each sweep step.
pub const SWEEP_DWELL_MS: u32 = 2000;

/// Capacity of the DFS lock report buffer.
pub const LOCK_REPORT_CAPACITY: usize = 512;

// --- Sleep modes ---

/// GPIO number of the status LED (informational; the pin is injected).
pub const LED_GPIO: u8 = 2;

/// LED on-time of one pulse.
pub const PULSE_HIGH_MS: u32 = 100;

/// Idle time after each pulse in ACTIVE mode.
pub const PULSE_IDLE_MS: u32 = 900;

/// Sleep demo behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Stay awake, blink forever.
    Active,
    /// Blink, light sleep until the wake timer fires, repeat.
    LightSleepTimer,
    /// Arm the wake timer and enter deep sleep.
    DeepSleepTimer,
}

impl PowerMode {
    /// Every mode, in documentation order.
    pub const ALL: [PowerMode; 3] = [Self::Active, Self::LightSleepTimer, Self::DeepSleepTimer];

    /// Name as written in `POWER_MODE`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::LightSleepTimer => "LIGHT_SLEEP_TIMER",
            Self::DeepSleepTimer => "DEEP_SLEEP_TIMER",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of resolving a `POWER_MODE` name.
///
/// An unknown name is carried through rather than rejected so the demo can
/// report it at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelection<'a> {
    /// A recognized mode.
    Mode(PowerMode),
    /// The name that matched no mode.
    Unrecognized(&'a str),
}

impl<'a> ModeSelection<'a> {
    /// Resolve a mode name.
    pub fn resolve(name: &'a str) -> Self {
        PowerMode::from_name(name).map_or(Self::Unrecognized(name), Self::Mode)
    }
}

/// The mode this firmware was built with.
pub fn mode_selection() -> ModeSelection<'static> {
    ModeSelection::resolve(POWER_MODE_NAME)
}

/// Parse an unsigned decimal in const context. `None` on empty input, any
/// non-digit or overflow.
pub const fn parse_decimal_u64(text: &str) -> Option<u64> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        // i < len checked by the loop condition
        #[allow(clippy::indexing_slicing)]
        let byte = bytes[i];
        if !byte.is_ascii_digit() {
            return None;
        }
        value = match value.checked_mul(10) {
            Some(v) => v,
            None => return None,
        };
        value = match value.checked_add(byte.wrapping_sub(b'0') as u64) {
            Some(v) => v,
            None => return None,
        };
        i = i.saturating_add(1);
    }
    Some(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip() {
        for mode in PowerMode::ALL {
            assert_eq!(PowerMode::from_name(mode.name()), Some(mode));
        }
    }

    #[test]
    fn mode_lookup_is_exact() {
        assert_eq!(PowerMode::from_name("deep_sleep_timer"), None);
        assert_eq!(PowerMode::from_name("DEEP_SLEEP"), None);
        assert_eq!(PowerMode::from_name(""), None);
    }

    #[test]
    fn unknown_name_is_carried_through() {
        assert_eq!(
            ModeSelection::resolve("HIBERNATE"),
            ModeSelection::Unrecognized("HIBERNATE")
        );
        assert_eq!(
            ModeSelection::resolve("ACTIVE"),
            ModeSelection::Mode(PowerMode::Active)
        );
    }

    #[test]
    fn valid_names_list_every_mode() {
        for mode in PowerMode::ALL {
            assert!(VALID_MODE_NAMES.contains(mode.name()));
        }
    }

    #[test]
    fn decimal_parser() {
        assert_eq!(parse_decimal_u64("5000000"), Some(5_000_000));
        assert_eq!(parse_decimal_u64("0"), Some(0));
        assert_eq!(parse_decimal_u64(""), None);
        assert_eq!(parse_decimal_u64("5s"), None);
        assert_eq!(parse_decimal_u64("-1"), None);
        assert_eq!(parse_decimal_u64("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_decimal_u64("18446744073709551616"), None);
    }

    #[test]
    fn build_time_constants_are_usable() {
        assert!(WAKE_TIMER_US > 0);
        assert_eq!(mode_selection(), ModeSelection::resolve(POWER_MODE_NAME));
    }

    #[test]
    fn sweep_steps_are_offered_ceilings() {
        let limits = platform::PlatformLimits::ESP32;
        for mhz in FREQUENCY_STEPS_MHZ {
            assert!(limits.check(&PowerConfig::fixed(mhz)).is_ok());
        }
        assert!(limits.check(&INITIAL_CONFIG).is_ok());
    }
}
