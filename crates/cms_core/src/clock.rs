//! Time source injected into write paths.

use crate::model::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the current time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                Timestamp::try_from(elapsed.as_millis()).unwrap_or(Timestamp::MAX)
            })
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

/// Timestamp for a mutation of a row last touched at `previous`.
///
/// Strictly greater than `previous` even when the clock has not advanced.
pub fn next_update_timestamp(clock: &impl Clock, previous: Timestamp) -> Timestamp {
    clock.now_ms().max(previous.saturating_add(1))
}
