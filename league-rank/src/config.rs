//! Configuration types for ranking and scheduling
//!
//! Level 4 - Utilities and configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

use league_core::{LeagueError, Result};

/// AlphaRank configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaRankConfig {
    /// Selection intensity (higher = greedier best response)
    pub alpha: f64,
    /// Baseline weight for non-improving deviations
    pub mutation: f64,
    /// L1 change below which power iteration stops
    pub tolerance: f64,
    /// Power iteration cap
    pub max_iterations: usize,
    /// Build the chain and iterate with rayon
    pub parallel: bool,
}

impl Default for AlphaRankConfig {
    fn default() -> Self {
        Self {
            alpha: 100.0,
            mutation: 1e-6,
            tolerance: 1e-12,
            max_iterations: 20_000,
            parallel: true,
        }
    }
}

impl AlphaRankConfig {
    pub fn new(alpha: f64, mutation: f64) -> Self {
        Self {
            alpha,
            mutation,
            ..Default::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Scoring weights for the adaptive scheduler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerWeights {
    /// Focal priority: uncertain agents first
    pub w_sigma: f64,
    /// Focal priority: under-played boost
    pub w_ucb: f64,
    /// Focal priority: hasn't played in a while
    pub w_stale: f64,
    /// Opponent score: pair match quality
    pub w_quality: f64,
    /// Opponent score: combined uncertainty
    pub w_sigma_sum: f64,
    /// Opponent score: penalty per earlier meeting
    pub w_repeat: f64,
    /// Chance to restrict opponents to the top-K by mu
    pub p_exploit: f64,
    pub top_k: usize,
    /// Elapsed time that maps to a staleness of 1.0
    pub stale_window_secs: i64,
    /// Staleness ceiling, also used for agents that never played
    pub stale_cap: f64,
}

impl Default for SchedulerWeights {
    fn default() -> Self {
        Self {
            w_sigma: 0.6,
            w_ucb: 0.3,
            w_stale: 0.1,
            w_quality: 0.7,
            w_sigma_sum: 0.3,
            w_repeat: 0.2,
            p_exploit: 0.25,
            top_k: 8,
            stale_window_secs: 7 * 24 * 3600,
            stale_cap: 1.5,
        }
    }
}

impl SchedulerWeights {
    /// `None` when the window is not positive or beyond chrono's range
    pub fn stale_window(&self) -> Option<Duration> {
        if self.stale_window_secs <= 0 {
            return None;
        }
        Duration::try_seconds(self.stale_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LeagueError::InvalidSettings(msg));
        if self.stale_window().is_none() {
            return invalid(format!(
                "scheduler stale_window_secs must be a positive number of seconds within range, got {}",
                self.stale_window_secs
            ));
        }
        if !(self.stale_cap.is_finite() && self.stale_cap >= 0.0) {
            return invalid(format!("scheduler stale_cap must be non-negative, got {}", self.stale_cap));
        }
        if !(0.0..=1.0).contains(&self.p_exploit) {
            return invalid(format!("scheduler p_exploit must be in [0, 1], got {}", self.p_exploit));
        }
        let weights = [
            ("w_sigma", self.w_sigma),
            ("w_ucb", self.w_ucb),
            ("w_stale", self.w_stale),
            ("w_quality", self.w_quality),
            ("w_sigma_sum", self.w_sigma_sum),
            ("w_repeat", self.w_repeat),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return invalid(format!("scheduler {} must be finite, got {}", name, value));
            }
        }
        Ok(())
    }

    /// Never restrict to the top-K frontier
    pub fn without_exploitation(mut self) -> Self {
        self.p_exploit = 0.0;
        self
    }

    /// Always restrict to the top-K frontier
    pub fn always_exploit(mut self, top_k: usize) -> Self {
        self.p_exploit = 1.0;
        self.top_k = top_k;
        self
    }
}

/// Pair selection strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Priority/quality scoring
    #[default]
    Adaptive,
    /// Two distinct agents uniformly at random
    Uniform,
}

/// Scheduler configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub kind: SchedulerKind,
    pub weights: SchedulerWeights,
}

impl SchedulerConfig {
    pub fn adaptive(weights: SchedulerWeights) -> Self {
        Self {
            kind: SchedulerKind::Adaptive,
            weights,
        }
    }

    pub fn uniform() -> Self {
        Self {
            kind: SchedulerKind::Uniform,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpharank_defaults() {
        let config = AlphaRankConfig::default();
        assert_eq!(config.alpha, 100.0);
        assert_eq!(config.mutation, 1e-6);
        assert_eq!(config.max_iterations, 20_000);
        assert!(config.parallel);
    }

    #[test]
    fn test_alpharank_builders() {
        let config = AlphaRankConfig::new(10.0, 1e-3).with_tolerance(1e-9).sequential();
        assert_eq!(config.alpha, 10.0);
        assert_eq!(config.tolerance, 1e-9);
        assert!(!config.parallel);
    }

    #[test]
    fn test_scheduler_weight_defaults() {
        let w = SchedulerWeights::default();
        assert_eq!(w.w_sigma, 0.6);
        assert_eq!(w.w_repeat, 0.2);
        assert_eq!(w.top_k, 8);
        assert_eq!(w.stale_window(), Some(Duration::days(7)));
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_stale_window_out_of_range_is_rejected() {
        for secs in [0, -60, i64::MAX / 10, i64::MAX] {
            let w = SchedulerWeights {
                stale_window_secs: secs,
                ..Default::default()
            };
            assert_eq!(w.stale_window(), None, "secs = {}", secs);
            assert!(matches!(w.validate(), Err(LeagueError::InvalidSettings(_))));
        }
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let w = SchedulerWeights {
            p_exploit: 1.5,
            ..Default::default()
        };
        assert!(w.validate().is_err());
        let w = SchedulerWeights {
            w_quality: f64::NAN,
            ..Default::default()
        };
        assert!(w.validate().is_err());
        let w = SchedulerWeights {
            stale_cap: f64::INFINITY,
            ..Default::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_scheduler_config_partial_toml_style() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"kind": "uniform"}"#).unwrap();
        assert_eq!(config.kind, SchedulerKind::Uniform);
        assert_eq!(config.weights, SchedulerWeights::default());
    }
}
