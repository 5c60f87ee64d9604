//! Wall-clock sources and virtual playback time
//!
//! Everything time-dependent in the crate takes the current instant as an
//! argument or through a [`TimeSource`], so tests can drive time by hand.
//!
//! - [`SystemClock`]: milliseconds since the Unix epoch
//! - [`ManualClock`]: set and advanced explicitly, shareable across threads
//! - [`VirtualTimeTracker`]: maps wall-clock instants to playback time

use std::sync::atomic::{AtomicI64, Ordering};

pub mod virtual_time;

pub use virtual_time::VirtualTimeTracker;

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Source of wall-clock time
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds
    fn now(&self) -> Timestamp;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Hand-driven clock for tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, timestamp: Timestamp) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
