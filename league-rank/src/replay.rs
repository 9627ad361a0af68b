//! Rating replay - fold decisive matches into ratings
//!
//! Shared by the incremental processor and the full rebuild, so both apply
//! exactly the same update to exactly the same sequence.

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use league_core::{
    AgentId, LeagueError, LeagueId, LeagueSettings, Match, MatchId, Rating, Skill, SkillModel,
};

/// Order in which a rebuild replays the match log
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOrder {
    /// Finish time ascending (unknown times first), ties by match id
    #[default]
    Time,
    /// Match id ascending
    Id,
}

impl ReplayOrder {
    pub fn sort(self, matches: &mut [Match]) {
        match self {
            ReplayOrder::Id => matches.sort_by_key(|m| m.match_id),
            // None < Some(_), so unknown finish times come first
            ReplayOrder::Time => matches.sort_by_key(|m| (m.finished_at, m.match_id)),
        }
    }
}

impl std::str::FromStr for ReplayOrder {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(ReplayOrder::Time),
            "id" => Ok(ReplayOrder::Id),
            other => Err(LeagueError::InvalidSettings(format!(
                "unknown replay order '{}', expected 'time' or 'id'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReplayOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayOrder::Time => write!(f, "time"),
            ReplayOrder::Id => write!(f, "id"),
        }
    }
}

/// In-memory ratings for one league while matches are being applied
pub struct RatingLedger {
    league_id: LeagueId,
    prior: Skill,
    model: Box<dyn SkillModel>,
    skills: FxHashMap<AgentId, Skill>,
    touched: FxHashSet<AgentId>,
    applied: usize,
    skipped: usize,
    last_applied: Option<MatchId>,
    max_applied: Option<MatchId>,
}

impl RatingLedger {
    /// Start from existing ratings; agents seen later begin at the league prior
    pub fn new(league_id: LeagueId, settings: &LeagueSettings, existing: impl IntoIterator<Item = Rating>) -> Self {
        let skills = existing
            .into_iter()
            .filter(|r| r.league_id == league_id)
            .map(|r| (r.agent_id, r.skill()))
            .collect();

        Self {
            league_id,
            prior: settings.prior(),
            model: settings.skill_model(),
            skills,
            touched: FxHashSet::default(),
            applied: 0,
            skipped: 0,
            last_applied: None,
            max_applied: None,
        }
    }

    /// Apply one match. Returns false for rows that do not count
    /// (undecided, self-play, foreign league).
    pub fn apply(&mut self, m: &Match) -> bool {
        if m.league_id != self.league_id {
            self.skipped += 1;
            return false;
        }
        let Some(outcome) = m.outcome() else {
            self.skipped += 1;
            return false;
        };

        let winner = self.skill_or_prior(outcome.winner);
        let loser = self.skill_or_prior(outcome.loser);
        let (winner, loser) = self.model.apply_win(winner, loser);

        self.skills.insert(outcome.winner, winner);
        self.skills.insert(outcome.loser, loser);
        self.touched.insert(outcome.winner);
        self.touched.insert(outcome.loser);

        self.applied += 1;
        self.last_applied = Some(m.match_id);
        self.max_applied = Some(self.max_applied.map_or(m.match_id, |id| id.max(m.match_id)));
        true
    }

    /// Apply matches in the given order; returns how many counted
    pub fn apply_all<'a>(&mut self, matches: impl IntoIterator<Item = &'a Match>) -> usize {
        let before = self.applied;
        for m in matches {
            self.apply(m);
        }
        self.applied - before
    }

    fn skill_or_prior(&self, agent_id: AgentId) -> Skill {
        self.skills.get(&agent_id).copied().unwrap_or(self.prior)
    }

    pub fn skill(&self, agent_id: AgentId) -> Option<Skill> {
        self.skills.get(&agent_id).copied()
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Id of the most recently applied match
    pub fn last_applied(&self) -> Option<MatchId> {
        self.last_applied
    }

    /// Largest id among applied matches
    pub fn max_applied(&self) -> Option<MatchId> {
        self.max_applied
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Ratings changed by `apply`, sorted by agent id
    pub fn touched_ratings(&self, now: DateTime<Utc>) -> Vec<Rating> {
        let mut ids: Vec<AgentId> = self.touched.iter().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|agent_id| self.rating_for(agent_id, Some(now)))
            .collect()
    }

    /// Every rating held by the ledger, sorted by agent id
    pub fn ratings(&self) -> Vec<Rating> {
        let mut ids: Vec<AgentId> = self.skills.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|agent_id| self.rating_for(agent_id, None)).collect()
    }

    fn rating_for(&self, agent_id: AgentId, updated_at: Option<DateTime<Utc>>) -> Rating {
        let mut rating = Rating::new(agent_id, self.league_id, self.skill_or_prior(agent_id));
        rating.updated_at = updated_at;
        rating
    }
}
