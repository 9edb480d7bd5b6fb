use std::cell::Cell;
use std::time::Instant;

/// Millisecond tick source for the scheduler, mutators and animators.
///
/// The machine never calls `Instant::now` directly; it is handed a clock at
/// construction so tests can drive time deterministically. One tick unit is
/// one millisecond since an arbitrary epoch.
pub trait Clock {
    fn ticks(&self) -> u64;
}

/// Wall clock measured from process-local construction time.
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn ticks(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock for tests.
pub struct FixedClock {
    now: Cell<u64>,
}

impl FixedClock {
    pub fn at(now: u64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: u64) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for FixedClock {
    fn ticks(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_only_on_request() {
        let clock = FixedClock::at(100);
        assert_eq!(clock.ticks(), 100);
        clock.advance(50);
        assert_eq!(clock.ticks(), 150);
        clock.set(0);
        assert_eq!(clock.ticks(), 0);
    }
}
