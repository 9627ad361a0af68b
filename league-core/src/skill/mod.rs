//! Skill models - Bayesian 1v1 rating updates
//!
//! A [`SkillModel`] turns one decisive result into new `(mu, sigma)` pairs
//! for both players. Updates are pure: the same inputs always give the
//! same outputs, independent of any earlier history.

pub mod gaussian;
mod true_skill;
mod weng_lin;

pub use true_skill::TrueSkill;
pub use weng_lin::WengLin;

use serde::{Deserialize, Serialize};

/// Lower bound on sigma after every update
pub const SIGMA_FLOOR: f64 = 1e-3;

/// Lower bound on the posterior variance before taking its square root
pub const VARIANCE_FLOOR: f64 = 1e-6;

/// Gaussian skill estimate
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub mu: f64,
    pub sigma: f64,
}

impl Skill {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Sigma after the per-match dynamics inflation
    pub fn inflated_sigma(&self, tau: f64) -> f64 {
        (self.sigma * self.sigma + tau * tau).sqrt()
    }
}

/// A 1v1 rating update rule
pub trait SkillModel: Send + Sync {
    /// Short identifier for logs and reports
    fn name(&self) -> &'static str;

    /// New skills for `(winner, loser)` after the winner beat the loser
    fn apply_win(&self, winner: Skill, loser: Skill) -> (Skill, Skill);

    /// Draw-likelihood style quality in `(0, 1]`; 1 means a perfectly even pairing
    fn match_quality(&self, a: Skill, b: Skill) -> f64;

    /// Predicted probability that `a` beats `b`
    fn win_probability(&self, a: Skill, b: Skill) -> f64;
}

/// `exp(-(mu_a - mu_b)^2 / (2 (2 beta^2 + sigma_a^2 + sigma_b^2)))`
pub fn match_quality(a: Skill, b: Skill, beta: f64) -> f64 {
    let c2 = 2.0 * beta * beta + a.sigma * a.sigma + b.sigma * b.sigma;
    if c2 <= 0.0 {
        return 0.0;
    }
    let dmu = a.mu - b.mu;
    (-(dmu * dmu) / (2.0 * c2)).exp()
}

/// Turn a posterior variance into a sigma that never collapses
pub(crate) fn floored_sigma(variance: f64) -> f64 {
    variance.max(VARIANCE_FLOOR).sqrt().max(SIGMA_FLOOR)
}

/// Winner's new mean; at least one ulp above `old` when the gain underflows
pub(crate) fn raised_mu(old: f64, new: f64) -> f64 {
    if new > old {
        new
    } else {
        next_up(old)
    }
}

/// Loser's new mean; at least one ulp below `old` when the drop underflows
pub(crate) fn lowered_mu(old: f64, new: f64) -> f64 {
    if new < old {
        new
    } else {
        -next_up(-old)
    }
}

/// Smallest double greater than `x`
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_quality_peaks_for_equal_skill() {
        let a = Skill::new(25.0, 8.0);
        let b = Skill::new(25.0, 8.0);
        assert!((match_quality(a, b, 4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absorbed_mean_moves_one_ulp() {
        assert_eq!(raised_mu(80.0, 80.0), f64::from_bits(80.0f64.to_bits() + 1));
        assert_eq!(lowered_mu(80.0, 80.0), f64::from_bits(80.0f64.to_bits() - 1));
        assert!(raised_mu(-3.0, -3.0) > -3.0);
        assert!(lowered_mu(-3.0, -3.0) < -3.0);
        assert!(raised_mu(0.0, 0.0) > 0.0);
        assert!(lowered_mu(0.0, 0.0) < 0.0);
        assert_eq!(raised_mu(1.0, 2.0), 2.0);
        assert_eq!(lowered_mu(1.0, 0.5), 0.5);
    }

    #[test]
    fn test_match_quality_drops_with_skill_gap() {
        let a = Skill::new(25.0, 2.0);
        let near = Skill::new(26.0, 2.0);
        let far = Skill::new(40.0, 2.0);
        assert!(match_quality(a, near, 4.0) > match_quality(a, far, 4.0));
    }

    #[test]
    fn test_match_quality_rises_with_uncertainty() {
        let a = Skill::new(25.0, 1.0);
        let b = Skill::new(35.0, 1.0);
        let b_uncertain = Skill::new(35.0, 8.0);
        assert!(match_quality(a, b_uncertain, 4.0) > match_quality(a, b, 4.0));
    }

    #[test]
    fn test_match_quality_degenerate_scale() {
        let a = Skill::new(1.0, 0.0);
        let b = Skill::new(2.0, 0.0);
        assert_eq!(match_quality(a, b, 0.0), 0.0);
    }

    #[test]
    fn test_floored_sigma() {
        assert_eq!(floored_sigma(-5.0), SIGMA_FLOOR);
        assert!((floored_sigma(4.0) - 2.0).abs() < 1e-12);
    }
}
