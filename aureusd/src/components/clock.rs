//! Epoch time for expiry and drift checks.

use chrono::Utc;

/// A source of epoch seconds.
///
/// Wall-clock time reaches the mempool only through this trait, so tests
/// can pin it.
pub trait Clock: Send + Sync + 'static {
    /// The current time, in epoch seconds.
    fn epoch_time(&self) -> u32;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_time(&self) -> u32 {
        Utc::now()
            .timestamp()
            .try_into()
            .expect("the current time is between 1970 and 2106")
    }
}
