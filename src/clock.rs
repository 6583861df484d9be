// Time source abstraction - the order core never reads the wall clock directly

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Source of "now" for elapsed-time and history stamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used by the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
///
/// Clones share the same instant, so a test can hand one clone to a
/// lifecycle or board and keep another to move time forward.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant() = instant;
    }

    pub fn advance(&self, by: Duration) {
        *self.instant() += by;
    }

    // a panicking holder cannot leave a half-written instant behind
    fn instant(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let observer = clock.clone();

        clock.advance(Duration::seconds(90));
        assert_eq!(observer.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(observer.now(), start);
    }

    #[test]
    fn test_manual_clock_survives_poisoned_lock() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        let holder = clock.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = holder.now.lock().unwrap();
            panic!("kitchen display crashed mid-update");
        })
        .join()
        .is_err();
        assert!(panicked);
        assert!(clock.now.is_poisoned());

        clock.advance(Duration::minutes(10));
        assert_eq!(clock.now(), start + Duration::minutes(10));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
