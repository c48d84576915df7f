//! Logging service abstraction
//!
//! Demo code never names a logging backend. It writes tagged, leveled lines
//! through a [`LogSink`]; the binding decides where they go (defmt/RTT on
//! hardware, `tracing` on desktop, a recording journal in tests).

use core::fmt;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogLevel {
    /// Verbose diagnostics
    Debug,
    /// Normal progress output
    Info,
    /// Unexpected but non-fatal
    Warn,
    /// Fatal or misconfiguration
    Error,
}

/// Destination for log lines
pub trait LogSink {
    /// Emit one line at `level`, attributed to `tag`.
    fn log(&mut self, level: LogLevel, tag: &str, args: fmt::Arguments<'_>);
}

impl<T: LogSink + ?Sized> LogSink for &mut T {
    fn log(&mut self, level: LogLevel, tag: &str, args: fmt::Arguments<'_>) {
        (**self).log(level, tag, args);
    }
}

/// [`LogSink`] forwarding to defmt (RTT on hardware).
#[cfg(feature = "defmt")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefmtLog;

#[cfg(feature = "defmt")]
impl LogSink for DefmtLog {
    fn log(&mut self, level: LogLevel, tag: &str, args: fmt::Arguments<'_>) {
        let line = defmt::Display2Format(&args);
        match level {
            LogLevel::Debug => defmt::debug!("{=str}: {}", tag, line),
            LogLevel::Info => defmt::info!("{=str}: {}", tag, line),
            LogLevel::Warn => defmt::warn!("{=str}: {}", tag, line),
            LogLevel::Error => defmt::error!("{=str}: {}", tag, line),
        }
    }
}
