//! Injectable time source
//!
//! The verifier reads the clock exactly once per verification and compares
//! that single instant against both `exp` and `auth_time`, so tests can pin
//! time to a boundary instant deterministically.

use std::time::{SystemTime, UNIX_EPOCH};

/// Clock for current time (enables testing with deterministic timestamps).
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock pinned to a fixed timestamp, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}
