//! Per-league hyperparameters and the rating cursor
//!
//! Settings are stored as one JSON document per league. Keys missing from a
//! stored document are filled with the defaults below when it is read back.

use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};
use crate::skill::{Skill, SkillModel, TrueSkill, WengLin};
use crate::types::MatchId;

mod defaults {
    pub const MU0: f64 = 25.0;
    pub const SIGMA0: f64 = 25.0 / 3.0;
    pub const BETA: f64 = 25.0 / 6.0;
    pub const TAU: f64 = 25.0 / 300.0;
    pub const DRAW_PROBABILITY: f64 = 0.0;
}

fn d_mu0() -> f64 {
    defaults::MU0
}
fn d_sigma0() -> f64 {
    defaults::SIGMA0
}
fn d_beta() -> f64 {
    defaults::BETA
}
fn d_tau() -> f64 {
    defaults::TAU
}
fn d_draw_probability() -> f64 {
    defaults::DRAW_PROBABILITY
}

/// Which update rule a league uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillModelKind {
    #[default]
    TrueSkill,
    WengLin,
}

impl std::str::FromStr for SkillModelKind {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "true_skill" | "trueskill" => Ok(SkillModelKind::TrueSkill),
            "weng_lin" | "wenglin" => Ok(SkillModelKind::WengLin),
            other => Err(LeagueError::InvalidSettings(format!("unknown skill model '{}'", other))),
        }
    }
}

/// League hyperparameters plus the incremental processing cursor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    /// Prior mean for a new rating
    #[serde(default = "d_mu0")]
    pub mu0: f64,
    /// Prior standard deviation for a new rating
    #[serde(default = "d_sigma0")]
    pub sigma0: f64,
    /// Performance variance
    #[serde(default = "d_beta")]
    pub beta: f64,
    /// Per-match uncertainty inflation
    #[serde(default = "d_tau")]
    pub tau: f64,
    /// Kept for compatibility; draws are never rated
    #[serde(default = "d_draw_probability")]
    pub draw_probability: f64,
    /// Id of the last match folded into the ratings. Never decreases
    /// except through a rebuild with reset.
    #[serde(default)]
    pub last_processed_match_id: MatchId,
    #[serde(default)]
    pub model: SkillModelKind,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            mu0: defaults::MU0,
            sigma0: defaults::SIGMA0,
            beta: defaults::BETA,
            tau: defaults::TAU,
            draw_probability: defaults::DRAW_PROBABILITY,
            last_processed_match_id: 0,
            model: SkillModelKind::TrueSkill,
        }
    }
}

impl LeagueSettings {
    /// Skill assigned to an agent on its first rated game
    pub fn prior(&self) -> Skill {
        Skill::new(self.mu0, self.sigma0)
    }

    /// Build the configured update rule
    pub fn skill_model(&self) -> Box<dyn SkillModel> {
        match self.model {
            SkillModelKind::TrueSkill => Box::new(TrueSkill::new(self.beta, self.tau)),
            SkillModelKind::WengLin => Box::new(WengLin::new(self.beta, self.tau)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mu0.is_finite() {
            return Err(LeagueError::InvalidSettings("mu0 must be finite".to_string()));
        }
        if !(self.sigma0.is_finite() && self.sigma0 > 0.0) {
            return Err(LeagueError::InvalidSettings("sigma0 must be positive".to_string()));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(LeagueError::InvalidSettings("beta must be positive".to_string()));
        }
        if !(self.tau.is_finite() && self.tau >= 0.0) {
            return Err(LeagueError::InvalidSettings("tau must be non-negative".to_string()));
        }
        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(LeagueError::InvalidSettings(
                "draw_probability must be in [0, 1)".to_string(),
            ));
        }
        if self.last_processed_match_id < 0 {
            return Err(LeagueError::InvalidSettings("cursor cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Apply overrides; returns whether anything changed
    pub fn apply(&mut self, overrides: &SettingsOverrides) -> bool {
        let before = self.clone();
        if let Some(mu0) = overrides.mu0 {
            self.mu0 = mu0;
        }
        if let Some(sigma0) = overrides.sigma0 {
            self.sigma0 = sigma0;
        }
        if let Some(beta) = overrides.beta {
            self.beta = beta;
        }
        if let Some(tau) = overrides.tau {
            self.tau = tau;
        }
        if let Some(draw_probability) = overrides.draw_probability {
            self.draw_probability = draw_probability;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        *self != before
    }
}

/// Partial settings update. The cursor is owned by the rating processors
/// and cannot be overridden.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default)]
    pub mu0: Option<f64>,
    #[serde(default)]
    pub sigma0: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub tau: Option<f64>,
    #[serde(default)]
    pub draw_probability: Option<f64>,
    #[serde(default)]
    pub model: Option<SkillModelKind>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        *self == SettingsOverrides::default()
    }
}
