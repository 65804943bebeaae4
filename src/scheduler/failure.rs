/// Consecutive fetch failures of one scheduler.
#[derive(Debug)]
pub struct FailureTracker {
    threshold: u32,
    consecutive_failures: u32,
    owner_notified: bool,
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_failures: 0,
            owner_notified: false,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.owner_notified = false;
    }

    /// Count a failure. Returns `true` when the operator should be alerted now;
    /// at most once per failure streak.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.threshold && !self.owner_notified {
            self.owner_notified = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_once_at_threshold() {
        let mut tracker = FailureTracker::new(5);
        let alerts: Vec<bool> = (0..8).map(|_| tracker.record_failure()).collect();

        assert_eq!(
            alerts,
            vec![false, false, false, false, true, false, false, false]
        );
        assert_eq!(tracker.consecutive_failures(), 8);
    }

    #[test]
    fn test_success_resets_streak() {
        let mut tracker = FailureTracker::new(2);
        tracker.record_failure();
        assert!(tracker.record_failure());

        tracker.record_success();
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(!tracker.record_failure());
        assert!(tracker.record_failure());
    }
}
