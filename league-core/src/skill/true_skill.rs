//! TrueSkill-style single-factor update for a decisive 1v1 game

use super::gaussian::{cdf, v_lose, v_win, w_lose, w_win};
use super::{floored_sigma, lowered_mu, match_quality, raised_mu, Skill, SkillModel};

/// Gaussian update with dynamics inflation and no draw margin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrueSkill {
    /// Performance variance
    pub beta: f64,
    /// Per-match uncertainty inflation
    pub tau: f64,
}

impl TrueSkill {
    pub fn new(beta: f64, tau: f64) -> Self {
        Self { beta, tau }
    }
}

impl SkillModel for TrueSkill {
    fn name(&self) -> &'static str {
        "true_skill"
    }

    fn apply_win(&self, winner: Skill, loser: Skill) -> (Skill, Skill) {
        let s_w = winner.inflated_sigma(self.tau);
        let s_l = loser.inflated_sigma(self.tau);
        let s_w2 = s_w * s_w;
        let s_l2 = s_l * s_l;

        let c2 = 2.0 * self.beta * self.beta + s_w2 + s_l2;
        let c = c2.sqrt();
        let t = (winner.mu - loser.mu) / c;

        let mu_w = raised_mu(winner.mu, winner.mu + (s_w2 / c) * v_win(t));
        let var_w = s_w2 * (1.0 - (s_w2 / c2) * w_win(t));

        let mu_l = lowered_mu(loser.mu, loser.mu - (s_l2 / c) * v_lose(t));
        let var_l = s_l2 * (1.0 - (s_l2 / c2) * w_lose(t));

        (
            Skill::new(mu_w, floored_sigma(var_w)),
            Skill::new(mu_l, floored_sigma(var_l)),
        )
    }

    fn match_quality(&self, a: Skill, b: Skill) -> f64 {
        match_quality(a, b, self.beta)
    }

    fn win_probability(&self, a: Skill, b: Skill) -> f64 {
        let c = (2.0 * self.beta * self.beta + a.sigma * a.sigma + b.sigma * b.sigma).sqrt();
        if c <= 0.0 {
            return 0.5;
        }
        cdf((a.mu - b.mu) / c)
    }
}
