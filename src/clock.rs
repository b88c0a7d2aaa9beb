use chrono::{Local, NaiveDateTime};

/// Source of "now" for admission checks. Injected into the engine so tests
/// can pin the clock instead of racing the wall.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the server's local zone. Dates and times are naive
/// everywhere; the service runs in a single implicit zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests.
pub struct FixedClock(std::sync::RwLock<NaiveDateTime>);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(std::sync::RwLock::new(now))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.0.write().expect("clock lock poisoned") = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.read().expect("clock lock poisoned")
    }
}
