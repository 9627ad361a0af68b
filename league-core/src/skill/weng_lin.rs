//! Weng-Lin Bradley-Terry update (logistic win probability)

use super::{floored_sigma, lowered_mu, match_quality, raised_mu, Skill, SkillModel};

/// Lower bound on the multiplicative variance shrink per game
const KAPPA: f64 = 1e-4;

/// Bradley-Terry flavoured Gaussian update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WengLin {
    pub beta: f64,
    pub tau: f64,
}

impl WengLin {
    pub fn new(beta: f64, tau: f64) -> Self {
        Self { beta, tau }
    }

    fn logistic(diff: f64, c: f64) -> f64 {
        1.0 / (1.0 + (-diff / c).exp())
    }
}

impl SkillModel for WengLin {
    fn name(&self) -> &'static str {
        "weng_lin"
    }

    fn apply_win(&self, winner: Skill, loser: Skill) -> (Skill, Skill) {
        let s_w = winner.inflated_sigma(self.tau);
        let s_l = loser.inflated_sigma(self.tau);
        let s_w2 = s_w * s_w;
        let s_l2 = s_l * s_l;

        let c2 = 2.0 * self.beta * self.beta + s_w2 + s_l2;
        let c = c2.sqrt();

        let p_w = Self::logistic(winner.mu - loser.mu, c);
        let p_l = 1.0 - p_w;

        let mu_w = raised_mu(winner.mu, winner.mu + (s_w2 / c) * p_l);
        let mu_l = lowered_mu(loser.mu, loser.mu - (s_l2 / c) * p_l);

        let eta_w = (s_w / c) * (s_w2 / c2) * p_w * p_l;
        let eta_l = (s_l / c) * (s_l2 / c2) * p_w * p_l;

        (
            Skill::new(mu_w, floored_sigma(s_w2 * (1.0 - eta_w).max(KAPPA))),
            Skill::new(mu_l, floored_sigma(s_l2 * (1.0 - eta_l).max(KAPPA))),
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
        Self::logistic(a.mu - b.mu, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_model() -> WengLin {
        WengLin::new(25.0 / 6.0, 25.0 / 300.0)
    }

    #[test]
    fn test_even_game_splits_symmetrically() {
        let model = default_model();
        let fresh = Skill::new(25.0, 25.0 / 3.0);
        let (w, l) = model.apply_win(fresh, fresh);
        assert!(w.mu > 25.0 && l.mu < 25.0);
        assert!(((w.mu - 25.0) - (25.0 - l.mu)).abs() < 1e-9);
        assert!(w.sigma < fresh.sigma);
    }

    #[test]
    fn test_winner_gains_and_loser_drops() {
        let model = default_model();
        let cases = [
            (Skill::new(25.0, 8.0), Skill::new(25.0, 8.0)),
            (Skill::new(10.0, 1.0), Skill::new(40.0, 1.0)),
            (Skill::new(40.0, 0.5), Skill::new(10.0, 6.0)),
            (Skill::new(500.0, 1.0), Skill::new(0.0, 1.0)),
            (Skill::new(0.0, 1.0), Skill::new(500.0, 1.0)),
        ];
        for (winner, loser) in cases {
            let (w, l) = model.apply_win(winner, loser);
            assert!(w.mu > winner.mu);
            assert!(l.mu < loser.mu);
        }
    }

    #[test]
    fn test_win_probability_is_complementary() {
        let model = default_model();
        let a = Skill::new(28.0, 3.0);
        let b = Skill::new(21.0, 5.0);
        let p = model.win_probability(a, b) + model.win_probability(b, a);
        assert!((p - 1.0).abs() < 1e-12);
    }
}
