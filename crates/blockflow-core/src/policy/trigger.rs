use std::time::Instant;

use super::{Gating, UpdatePolicy};

/// Tracks when a block last ran on its fixed-rate timer.
#[derive(Debug, Clone, Default)]
pub struct FixedRateTimer {
    last: Option<Instant>,
}

impl FixedRateTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a full period has elapsed. `false` when the policy has no timer.
    pub fn is_due(&self, policy: &UpdatePolicy, now: Instant) -> bool {
        match (policy.period(), self.last) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(period), Some(last)) => now.saturating_duration_since(last) >= period,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Combine the timer and the inlet triggers into one readiness decision.
pub fn evaluate(policy: &UpdatePolicy, timer_due: bool, inlets_ready: bool) -> bool {
    if policy.period().is_none() {
        return inlets_ready;
    }
    match policy.gating {
        Gating::All => timer_due && inlets_ready,
        Gating::Any => timer_due || inlets_ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timer_fires_once_per_period() {
        let policy = UpdatePolicy::default().with_rate(10.0);
        let mut timer = FixedRateTimer::new();
        let t0 = Instant::now();
        assert!(timer.is_due(&policy, t0));
        timer.mark(t0);
        assert!(!timer.is_due(&policy, t0 + Duration::from_millis(50)));
        assert!(timer.is_due(&policy, t0 + Duration::from_millis(100)));
    }

    #[test]
    fn gating_modes() {
        let all = UpdatePolicy::default().with_rate(1.0);
        let any = all.clone().with_gating(Gating::Any);
        assert!(!evaluate(&all, true, false));
        assert!(evaluate(&all, true, true));
        assert!(evaluate(&any, true, false));
        assert!(evaluate(&any, false, true));
        assert!(!evaluate(&any, false, false));
        assert!(evaluate(&UpdatePolicy::default(), false, true));
    }
}
