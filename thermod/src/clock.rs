//! Wall-clock access, abstracted so tests can drive virtual time.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local};

/// Source of the current wall time for the control cycle.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The system wall clock used by the daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A manually driven clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
