//! Timing service abstraction
//!
//! A monotonic microsecond clock and a cooperative delay that yields to the
//! executor rather than spinning.

/// Monotonic clock with cooperative delay
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin. Never decreases.
    fn now_us(&self) -> u64;

    /// Suspend the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) -> impl core::future::Future<Output = ()>;

    /// Microseconds elapsed since `start_us` (a previous [`now_us`](Self::now_us)).
    fn elapsed_us(&self, start_us: u64) -> u64 {
        self.now_us().saturating_sub(start_us)
    }
}

/// [`Clock`] backed by the embassy-time driver.
///
/// On hardware the driver is the platform's tick timer; on desktop it is the
/// embassy-time `std` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    /// Create a clock reading the global embassy-time driver.
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }

    async fn delay_ms(&mut self, ms: u32) {
        embassy_time::Timer::after_millis(u64::from(ms)).await;
    }
}
