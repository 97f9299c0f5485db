use std::time::{Duration, Instant};

/// Single-shot timer that collapses bursts of change notifications into one
/// simulation run. Re-arming while armed moves the deadline.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        DebounceTimer {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)starts the countdown from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per armed period, the first time it is
    /// polled at or after the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the deadline, `None` when idle.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_of_triggers_fires_once() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(200));

        for i in 0..10 {
            timer.arm(start + Duration::from_millis(i * 10));
        }
        // Last arm at 90 ms, deadline at 290 ms.
        assert!(!timer.fire_if_due(start + Duration::from_millis(250)));
        assert!(timer.fire_if_due(start + Duration::from_millis(290)));
        assert!(!timer.fire_if_due(start + Duration::from_millis(1000)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_and_remaining() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(200));
        assert_eq!(timer.remaining(start), None);

        timer.arm(start);
        assert_eq!(
            timer.remaining(start + Duration::from_millis(50)),
            Some(Duration::from_millis(150))
        );
        assert_eq!(
            timer.remaining(start + Duration::from_millis(500)),
            Some(Duration::ZERO)
        );

        timer.cancel();
        assert!(!timer.fire_if_due(start + Duration::from_secs(1)));
    }
}
