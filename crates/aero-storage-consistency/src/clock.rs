use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A monotonically-advancing (from the shim's point of view) millisecond
/// clock, injected so the write/read path's timing rules are testable
/// without sleeping in real time.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Default `Clock` backed by the real wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_millis() as u64
    }
}

/// A clock whose reading is set by the test driving it, not by real time.
///
/// Exported (not `#[cfg(test)]`-gated) so integration tests outside this
/// crate can construct a [`crate::ConsistencyShim`] with deterministic
/// timestamps.
#[derive(Debug, Default)]
pub struct FakeClock {
    millis: AtomicU64,
}

impl FakeClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_millis: u64) {
        self.millis.fetch_add(delta_millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
