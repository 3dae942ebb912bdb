//! Injectable unix-seconds time source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix-seconds source. Injected into [`crate::issuer::Issuer`] and
/// [`crate::verifier::Verifier`] rather than read from a global, so tests
/// can control skew deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_secs()
    }
}

/// A deterministic clock for tests, adjustable via [`TestClock::set`] and
/// [`TestClock::advance`].
#[derive(Debug, Default)]
pub struct TestClock(AtomicU64);

impl TestClock {
    pub fn new(initial: u64) -> Self {
        TestClock(AtomicU64::new(initial))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn system_clock_is_plausible() {
        let now = SystemClock.now();
        assert!(now > 1_700_000_000);
    }

    #[test]
    fn test_clock_advances() {
        let clock = TestClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(120);
        assert_eq!(clock.now(), 1_120);
        clock.set(0);
        assert_eq!(clock.now(), 0);
    }
}
