use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Microseconds since the engine clock started.
pub type Timestamp = u64;

/// Engine-wide monotonic clock. Every call to [`Clock::now`] returns a timestamp strictly
/// greater than the previous one, so two publishes never share a timestamp.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last: AtomicU64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: AtomicU64::new(0),
        }
    }

    pub fn now(&self) -> Timestamp {
        let raw = self.start.elapsed().as_micros() as u64;
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(raw.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        raw.max(prev + 1)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_strictly_increase() {
        let clock = Clock::new();
        let mut prev = 0;
        for _ in 0..10_000 {
            let t = clock.now();
            assert!(t > prev);
            prev = t;
        }
    }
}
