//! Match scheduling - choose who plays next
//!
//! Level 2 - Phases and Level 3 - Steps
//!
//! The adaptive scheduler first picks a focal agent (uncertain, under-played
//! or stale agents first), then the opponent that gives the most informative
//! game for it. Randomness and the clock are supplied by the caller.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use rustc_hash::FxHashMap;

use league_core::skill::match_quality;
use league_core::{AgentId, LeagueSettings, Match, Rating, Skill};

use crate::config::{SchedulerConfig, SchedulerKind, SchedulerWeights};

/// What the scheduler knows about one agent
#[derive(Clone, Debug, PartialEq)]
pub struct AgentStat {
    pub agent_id: AgentId,
    pub skill: Skill,
    /// Decisive games played in the league
    pub played: u32,
    pub last_played: Option<DateTime<Utc>>,
}

/// Read-only view of a league used for pair selection
#[derive(Clone, Debug)]
pub struct LeagueSnapshot {
    /// Sorted by agent id
    agents: Vec<AgentStat>,
    total_matches: u64,
    pair_counts: FxHashMap<(AgentId, AgentId), u32>,
    beta: f64,
}

impl LeagueSnapshot {
    /// Assemble the snapshot from stored rows.
    ///
    /// The population is every rated agent plus every entrant that has no
    /// rating yet; the latter are placed at the league prior.
    pub fn build(ratings: &[Rating], matches: &[Match], entrants: &[AgentId], settings: &LeagueSettings) -> Self {
        let mut stats: FxHashMap<AgentId, AgentStat> = FxHashMap::default();
        for r in ratings {
            stats.insert(r.agent_id, AgentStat::new(r.agent_id, r.skill()));
        }
        for &agent_id in entrants {
            stats
                .entry(agent_id)
                .or_insert_with(|| AgentStat::new(agent_id, settings.prior()));
        }

        let mut total_matches = 0;
        let mut pair_counts: FxHashMap<(AgentId, AgentId), u32> = FxHashMap::default();
        for m in matches {
            let Some(outcome) = m.outcome() else {
                continue;
            };
            total_matches += 1;
            *pair_counts.entry(pair_key(outcome.winner, outcome.loser)).or_default() += 1;

            for agent_id in [outcome.winner, outcome.loser] {
                if let Some(stat) = stats.get_mut(&agent_id) {
                    stat.played += 1;
                    if let Some(at) = m.played_at() {
                        stat.last_played = Some(stat.last_played.map_or(at, |prev| prev.max(at)));
                    }
                }
            }
        }

        let mut agents: Vec<AgentStat> = stats.into_values().collect();
        agents.sort_by_key(|s| s.agent_id);

        Self {
            agents,
            total_matches,
            pair_counts,
            beta: settings.beta,
        }
    }

    /// Build directly from agent stats, mostly for tests and tools
    pub fn from_stats(mut agents: Vec<AgentStat>, total_matches: u64, beta: f64) -> Self {
        agents.sort_by_key(|s| s.agent_id);
        Self {
            agents,
            total_matches,
            pair_counts: FxHashMap::default(),
            beta,
        }
    }

    pub fn with_pair_count(mut self, a: AgentId, b: AgentId, count: u32) -> Self {
        self.pair_counts.insert(pair_key(a, b), count);
        self
    }

    pub fn agents(&self) -> &[AgentStat] {
        &self.agents
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<&AgentStat> {
        self.agents
            .binary_search_by_key(&agent_id, |s| s.agent_id)
            .ok()
            .map(|i| &self.agents[i])
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Decisive matches in the league
    pub fn total_matches(&self) -> u64 {
        self.total_matches
    }

    /// Decisive games between two agents, in either seat order
    pub fn pair_count(&self, a: AgentId, b: AgentId) -> u32 {
        self.pair_counts.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl AgentStat {
    pub fn new(agent_id: AgentId, skill: Skill) -> Self {
        Self {
            agent_id,
            skill,
            played: 0,
            last_played: None,
        }
    }

    pub fn with_history(mut self, played: u32, last_played: Option<DateTime<Utc>>) -> Self {
        self.played = played;
        self.last_played = last_played;
        self
    }
}

#[inline]
fn pair_key(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    (a.min(b), a.max(b))
}

/// Chooses the next ordered pair to play
pub trait PairSelector: Send + Sync {
    fn name(&self) -> &'static str;

    /// `(focal, opponent)` with distinct agents, or `None` for fewer than two agents
    fn select(&self, snapshot: &LeagueSnapshot, now: DateTime<Utc>, rng: &mut dyn RngCore) -> Option<(AgentId, AgentId)>;
}

/// Build the selector named by the configuration
pub fn selector_for(config: &SchedulerConfig) -> Box<dyn PairSelector> {
    match config.kind {
        SchedulerKind::Adaptive => Box::new(AdaptiveScheduler::new(config.weights.clone())),
        SchedulerKind::Uniform => Box::new(UniformRandom),
    }
}

// ============================================================================
// Adaptive scheduler
// ============================================================================

/// Uncertainty/coverage driven pair selection
#[derive(Clone, Debug, Default)]
pub struct AdaptiveScheduler {
    pub weights: SchedulerWeights,
}

impl AdaptiveScheduler {
    pub fn new(weights: SchedulerWeights) -> Self {
        Self { weights }
    }

    /// Elapsed time since the last game scaled by the staleness window, capped
    pub fn staleness(&self, stat: &AgentStat, now: DateTime<Utc>) -> f64 {
        let cap = self.weights.stale_cap;
        let Some(last) = stat.last_played else {
            return cap;
        };
        let Some(window) = self.weights.stale_window().map(|w| w.num_milliseconds()) else {
            return cap;
        };
        let elapsed = (now - last).num_milliseconds().max(0);
        (elapsed as f64 / window as f64).min(cap)
    }

    /// How urgently an agent needs a game
    pub fn focal_priority(&self, stat: &AgentStat, snapshot: &LeagueSnapshot, now: DateTime<Utc>) -> f64 {
        let w = &self.weights;
        let total = snapshot.total_matches() as f64;
        let ucb = ((total + 1.0).ln() / (stat.played as f64 + 1.0)).sqrt();
        w.w_sigma * stat.skill.sigma + w.w_ucb * ucb + w.w_stale * self.staleness(stat, now)
    }

    /// How informative a game between `focal` and `other` would be
    pub fn opponent_score(&self, focal: &AgentStat, other: &AgentStat, snapshot: &LeagueSnapshot) -> f64 {
        let w = &self.weights;
        let quality = match_quality(focal.skill, other.skill, snapshot.beta());
        let repeats = snapshot.pair_count(focal.agent_id, other.agent_id) as f64;
        w.w_quality * quality + w.w_sigma_sum * (focal.skill.sigma + other.skill.sigma) - w.w_repeat * repeats
    }

    fn pick_focal<'a>(&self, snapshot: &'a LeagueSnapshot, now: DateTime<Utc>) -> Option<&'a AgentStat> {
        let mut best: Option<(&AgentStat, f64)> = None;
        for stat in snapshot.agents() {
            let priority = self.focal_priority(stat, snapshot, now);
            if best.map_or(true, |(_, p)| priority > p) {
                best = Some((stat, priority));
            }
        }
        best.map(|(stat, _)| stat)
    }

    /// Everyone but the focal agent, or just the top-K by mu when exploiting
    fn candidates<'a>(&self, snapshot: &'a LeagueSnapshot, focal: AgentId, exploit: bool) -> Vec<&'a AgentStat> {
        let mut others: Vec<&AgentStat> = snapshot.agents().iter().filter(|s| s.agent_id != focal).collect();
        if exploit && self.weights.top_k > 0 {
            others.sort_by(|a, b| {
                b.skill
                    .mu
                    .total_cmp(&a.skill.mu)
                    .then_with(|| a.agent_id.cmp(&b.agent_id))
            });
            others.truncate(self.weights.top_k);
            others.sort_by_key(|s| s.agent_id);
        }
        others
    }
}

impl PairSelector for AdaptiveScheduler {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn select(&self, snapshot: &LeagueSnapshot, now: DateTime<Utc>, rng: &mut dyn RngCore) -> Option<(AgentId, AgentId)> {
        if snapshot.len() < 2 {
            return None;
        }
        let focal = self.pick_focal(snapshot, now)?;
        let exploit = rng.gen::<f64>() < self.weights.p_exploit;

        let mut best: Option<(&AgentStat, f64)> = None;
        for other in self.candidates(snapshot, focal.agent_id, exploit) {
            let score = self.opponent_score(focal, other, snapshot);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((other, score));
            }
        }
        best.map(|(other, _)| (focal.agent_id, other.agent_id))
    }
}

// ============================================================================
// Uniform random
// ============================================================================

/// Two distinct agents drawn uniformly at random
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformRandom;

impl PairSelector for UniformRandom {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn select(&self, snapshot: &LeagueSnapshot, _now: DateTime<Utc>, rng: &mut dyn RngCore) -> Option<(AgentId, AgentId)> {
        let n = snapshot.len();
        if n < 2 {
            return None;
        }
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        let agents = snapshot.agents();
        Some((agents[i].agent_id, agents[j].agent_id))
    }
}
