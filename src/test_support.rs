//! Shared fixtures for in-crate unit tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock whose reading only changes when a test moves it.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock fixed at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Creates a clock fixed at 2026-01-05T09:00:00Z.
    pub fn at_default() -> Self {
        Self::new(default_start())
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().expect("clock lock should not be poisoned");
        *guard += delta;
    }

    /// Sets the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.now.lock().expect("clock lock should not be poisoned");
        *guard = at;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock should not be poisoned")
    }
}

/// Fixed instant used as the starting point of deterministic tests.
pub fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
        .single()
        .expect("valid fixed timestamp")
}
