//! Update policies: per-inlet trigger rules plus the block-level fixed-rate timer and gating.

mod trigger;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub use trigger::{FixedRateTimer, evaluate};

/// Per-inlet trigger rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InletPolicy {
    /// Never blocks the owning block.
    Always,
    /// Ready when the inlet holds data newer than what the block last consumed.
    #[default]
    NewerTimestamp,
    /// Ready when the inlet's value passes its validity predicate.
    ValidData,
}

impl InletPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            InletPolicy::Always => "always",
            InletPolicy::NewerTimestamp => "newer timestamp",
            InletPolicy::ValidData => "valid data",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "always" => Ok(InletPolicy::Always),
            "newer timestamp" | "newer" => Ok(InletPolicy::NewerTimestamp),
            "valid data" | "valid" => Ok(InletPolicy::ValidData),
            other => Err(EngineError::NotFound(format!(
                "update policy {} not found",
                other
            ))),
        }
    }
}

impl fmt::Display for InletPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the fixed-rate timer combines with inlet triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gating {
    /// Timer elapsed AND every inlet trigger ready.
    #[default]
    All,
    /// Timer elapsed OR every inlet trigger ready.
    Any,
}

/// Block-level update policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    #[serde(default)]
    pub default_inlet_policy: InletPolicy,
    /// Fixed update rate in Hz; `0.0` disables the timer.
    #[serde(default)]
    pub rate_hz: f64,
    #[serde(default)]
    pub gating: Gating,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            default_inlet_policy: InletPolicy::default(),
            rate_hz: 0.0,
            gating: Gating::default(),
        }
    }
}

impl UpdatePolicy {
    pub fn with_rate(mut self, hz: f64) -> Self {
        self.set_rate(hz);
        self
    }

    pub fn with_gating(mut self, gating: Gating) -> Self {
        self.gating = gating;
        self
    }

    pub fn with_default_inlet_policy(mut self, policy: InletPolicy) -> Self {
        self.default_inlet_policy = policy;
        self
    }

    /// Negative and non-finite rates are treated as zero.
    pub fn set_rate(&mut self, hz: f64) {
        self.rate_hz = if hz.is_finite() && hz > 0.0 { hz } else { 0.0 };
    }

    pub fn period(&self) -> Option<Duration> {
        (self.rate_hz > 0.0).then(|| Duration::from_secs_f64(1.0 / self.rate_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_disables_timer() {
        assert!(UpdatePolicy::default().period().is_none());
        assert!(UpdatePolicy::default().with_rate(-3.0).period().is_none());
        assert_eq!(
            UpdatePolicy::default().with_rate(4.0).period(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn policy_names_round_trip() {
        for policy in [
            InletPolicy::Always,
            InletPolicy::NewerTimestamp,
            InletPolicy::ValidData,
        ] {
            assert_eq!(InletPolicy::parse(policy.name()).unwrap(), policy);
        }
        assert!(InletPolicy::parse("sometimes").is_err());
    }
}
