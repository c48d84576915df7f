//! Power management abstraction
//!
//! Dynamic frequency scaling (DFS) configuration, lock diagnostics and CPU
//! clock read-back.

use core::fmt;

/// Power management interface
///
/// Mirrors the vendor power-management service: the service owns the active
/// DFS range and picks the realized CPU frequency inside it, subject to any
/// power-management locks held elsewhere in the system.
pub trait PowerManager {
    /// Read the currently active power configuration.
    fn configuration(&self) -> Result<PowerConfig, PowerError>;

    /// Submit a new power configuration.
    ///
    /// Replaces the active configuration as a whole. Rejects ranges the
    /// platform cannot run ([`PowerError::InvalidArgument`]) and light sleep
    /// when the platform lacks tickless idle ([`PowerError::NotSupported`]).
    fn configure(&mut self, config: &PowerConfig) -> Result<(), PowerError>;

    /// Write a human-readable table of power-management locks to `out`.
    fn dump_locks(&self, out: &mut dyn fmt::Write) -> Result<(), PowerError>;

    /// Read the realized CPU clock frequency in Hz.
    fn cpu_frequency_hz(&self) -> Result<u32, PowerError>;
}

/// DFS configuration: frequency range and light-sleep permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// Lowest CPU frequency DFS may select (MHz)
    pub min_freq_mhz: u32,
    /// Highest CPU frequency DFS may select (MHz)
    pub max_freq_mhz: u32,
    /// Allow automatic light sleep when every task is blocked
    pub light_sleep_enable: bool,
}

impl PowerConfig {
    /// DFS range `[min, max]` with automatic light sleep disabled.
    pub const fn range(min_freq_mhz: u32, max_freq_mhz: u32) -> Self {
        Self {
            min_freq_mhz,
            max_freq_mhz,
            light_sleep_enable: false,
        }
    }

    /// Pin the CPU to one frequency (`min == max`), light sleep disabled.
    pub const fn fixed(freq_mhz: u32) -> Self {
        Self::range(freq_mhz, freq_mhz)
    }

    /// `true` if `min_freq_mhz == max_freq_mhz`.
    pub const fn is_fixed(&self) -> bool {
        self.min_freq_mhz == self.max_freq_mhz
    }

    /// `"TRUE"` / `"FALSE"` rendering of [`light_sleep_enable`](Self::light_sleep_enable).
    pub const fn light_sleep_label(&self) -> &'static str {
        if self.light_sleep_enable {
            "TRUE"
        } else {
            "FALSE"
        }
    }
}

/// Frequencies and features a platform's power service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlatformLimits {
    /// Valid values for `max_freq_mhz` (PLL-derived CPU clocks).
    pub max_freq_choices_mhz: &'static [u32],
    /// Valid values for `min_freq_mhz` (PLL or crystal-derived CPU clocks).
    pub min_freq_choices_mhz: &'static [u32],
    /// Crystal frequency; the lowest clock DFS can fall back to.
    pub xtal_freq_mhz: u32,
    /// Whether the RTOS tick can be suppressed (required for DFS light sleep).
    pub tickless_idle: bool,
}

impl PlatformLimits {
    /// Dual-core 240 MHz Xtensa part with a 40 MHz crystal.
    pub const ESP32: Self = Self {
        max_freq_choices_mhz: &[80, 160, 240],
        min_freq_choices_mhz: &[40, 80, 160, 240],
        xtal_freq_mhz: 40,
        tickless_idle: false,
    };

    /// Validate a configuration against these limits.
    ///
    /// # Errors
    ///
    /// - [`PowerError::InvalidArgument`] if either frequency is not offered by
    ///   the platform or `min > max`.
    /// - [`PowerError::NotSupported`] if light sleep is requested without
    ///   tickless idle.
    pub fn check(&self, config: &PowerConfig) -> Result<(), PowerError> {
        if !self.max_freq_choices_mhz.contains(&config.max_freq_mhz)
            || !self.min_freq_choices_mhz.contains(&config.min_freq_mhz)
            || config.min_freq_mhz < self.xtal_freq_mhz
            || config.min_freq_mhz > config.max_freq_mhz
        {
            return Err(PowerError::InvalidArgument);
        }
        if config.light_sleep_enable && !self.tickless_idle {
            return Err(PowerError::NotSupported);
        }
        Ok(())
    }
}

/// Kind of constraint a power-management lock places on DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockType {
    /// Holds the CPU at `max_freq_mhz` while acquired
    CpuFreqMax,
    /// Holds the APB bus at its maximum frequency while acquired
    ApbFreqMax,
    /// Prevents automatic light sleep while acquired
    NoLightSleep,
}

impl LockType {
    /// Column label used in lock reports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CpuFreqMax => "CPU_FREQ_MAX",
            Self::ApbFreqMax => "APB_FREQ_MAX",
            Self::NoLightSleep => "NO_LIGHT_SLEEP",
        }
    }
}

/// One power-management lock as seen by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PmLock {
    /// Owner-chosen lock name (e.g. `"rtos0"`)
    pub name: &'static str,
    /// Constraint applied while held
    pub kind: LockType,
    /// Owner-defined argument (core index for RTOS locks)
    pub arg: i32,
    /// Number of outstanding acquisitions; the lock is active while > 0
    pub active_count: u32,
}

impl PmLock {
    /// `true` while at least one acquisition is outstanding.
    pub const fn is_active(&self) -> bool {
        self.active_count > 0
    }
}

/// Render `locks` as the fixed-width table used by lock reports.
///
/// ```text
/// Lock stats:
///               Name            Type  Arg  Active
///              rtos0    CPU_FREQ_MAX    0       1
/// ```
pub fn write_lock_table(locks: &[PmLock], out: &mut dyn fmt::Write) -> fmt::Result {
    writeln!(out, "Lock stats:")?;
    writeln!(out, "{:>18}  {:>14}  {:>3}  {:>6}", "Name", "Type", "Arg", "Active")?;
    for lock in locks {
        writeln!(
            out,
            "{:>18}  {:>14}  {:>3}  {:>6}",
            lock.name,
            lock.kind.label(),
            lock.arg,
            lock.active_count
        )?;
    }
    Ok(())
}

/// Power service failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// Configuration outside what the platform accepts
    #[error("invalid argument")]
    InvalidArgument,
    /// Feature not available in this build of the platform
    #[error("not supported")]
    NotSupported,
    /// Service not ready for the request
    #[error("invalid state")]
    InvalidState,
    /// Diagnostic report did not fit the caller's buffer
    #[error("report exceeded the output buffer")]
    ReportOverflow,
    /// Vendor driver error code
    #[error("driver error {0}")]
    Driver(i32),
}

impl From<fmt::Error> for PowerError {
    fn from(_: fmt::Error) -> Self {
        Self::ReportOverflow
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sets_min_equal_max() {
        let cfg = PowerConfig::fixed(160);
        assert_eq!(cfg.min_freq_mhz, 160);
        assert_eq!(cfg.max_freq_mhz, 160);
        assert!(!cfg.light_sleep_enable);
        assert!(cfg.is_fixed());
    }

    #[test]
    fn test_esp32_accepts_demo_configurations() {
        let limits = PlatformLimits::ESP32;
        assert_eq!(limits.check(&PowerConfig::range(80, 240)), Ok(()));
        for mhz in [80, 160, 240] {
            assert_eq!(limits.check(&PowerConfig::fixed(mhz)), Ok(()));
        }
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        let limits = PlatformLimits::ESP32;
        assert_eq!(
            limits.check(&PowerConfig::range(240, 80)),
            Err(PowerError::InvalidArgument)
        );
    }

    #[test]
    fn test_unsupported_frequency_is_invalid() {
        let limits = PlatformLimits::ESP32;
        assert_eq!(
            limits.check(&PowerConfig::fixed(120)),
            Err(PowerError::InvalidArgument)
        );
        // 40 MHz is a valid floor but not a valid ceiling.
        assert_eq!(
            limits.check(&PowerConfig::fixed(40)),
            Err(PowerError::InvalidArgument)
        );
        assert_eq!(limits.check(&PowerConfig::range(40, 80)), Ok(()));
    }

    #[test]
    fn test_light_sleep_requires_tickless_idle() {
        let cfg = PowerConfig {
            light_sleep_enable: true,
            ..PowerConfig::range(80, 240)
        };
        assert_eq!(PlatformLimits::ESP32.check(&cfg), Err(PowerError::NotSupported));

        let tickless = PlatformLimits {
            tickless_idle: true,
            ..PlatformLimits::ESP32
        };
        assert_eq!(tickless.check(&cfg), Ok(()));
    }

    #[test]
    fn test_lock_table_lists_every_lock() {
        let locks = [
            PmLock {
                name: "rtos0",
                kind: LockType::CpuFreqMax,
                arg: 0,
                active_count: 1,
            },
            PmLock {
                name: "wifi",
                kind: LockType::ApbFreqMax,
                arg: 0,
                active_count: 0,
            },
        ];
        let mut out = heapless::String::<256>::new();
        write_lock_table(&locks, &mut out).unwrap();

        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Lock stats:"));
        assert!(lines.next().unwrap().contains("Active"));
        let rtos = lines.next().unwrap();
        assert!(rtos.contains("rtos0") && rtos.contains("CPU_FREQ_MAX"));
        assert!(rtos.trim_end().ends_with('1'));
        assert!(lines.next().unwrap().contains("APB_FREQ_MAX"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_lock_table_overflow_maps_to_report_overflow() {
        let locks = [PmLock {
            name: "rtos0",
            kind: LockType::CpuFreqMax,
            arg: 0,
            active_count: 1,
        }];
        let mut tiny = heapless::String::<8>::new();
        let err: PowerError = write_lock_table(&locks, &mut tiny).unwrap_err().into();
        assert_eq!(err, PowerError::ReportOverflow);
    }
}
