//! Empirical head-to-head win rates
//!
//! Level 3 - Steps

use rustc_hash::FxHashMap;

use league_core::{AgentId, Match};

/// Observed results of `row` against `col`, from `row`'s point of view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalRecord {
    pub row: AgentId,
    pub col: AgentId,
    pub wins: u32,
    pub games: u32,
}

/// Dense `p[i][j]` over the agents that took part in at least one decisive match.
///
/// Agents are indexed in ascending id order. A pair with games in only one
/// direction takes the complement of that direction (with the same game
/// count); a pair with no games at all is neutral `0.5` with zero games.
#[derive(Clone, Debug)]
pub struct WinRateMatrix {
    agents: Vec<AgentId>,
    index: FxHashMap<AgentId, usize>,
    rates: Vec<f64>,
    games: Vec<u32>,
}

impl WinRateMatrix {
    /// Count decisive matches; everything else is ignored
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut counts: FxHashMap<(AgentId, AgentId), (u32, u32)> = FxHashMap::default();
        for m in matches {
            let Some(outcome) = m.outcome() else {
                continue;
            };
            let won = counts.entry((outcome.winner, outcome.loser)).or_insert((0, 0));
            won.0 += 1;
            won.1 += 1;
            let lost = counts.entry((outcome.loser, outcome.winner)).or_insert((0, 0));
            lost.1 += 1;
        }

        let records = counts
            .into_iter()
            .map(|((row, col), (wins, games))| DirectionalRecord { row, col, wins, games });
        Self::from_records(records)
    }

    /// Build from per-direction tallies, inferring missing directions
    pub fn from_records(records: impl IntoIterator<Item = DirectionalRecord>) -> Self {
        let mut observed: FxHashMap<(AgentId, AgentId), (u32, u32)> = FxHashMap::default();
        for r in records {
            if r.row == r.col || r.games == 0 {
                continue;
            }
            let entry = observed.entry((r.row, r.col)).or_insert((0, 0));
            entry.0 += r.wins.min(r.games);
            entry.1 += r.games;
        }

        let mut agents: Vec<AgentId> = observed.keys().flat_map(|&(a, b)| [a, b]).collect();
        agents.sort_unstable();
        agents.dedup();
        let index: FxHashMap<AgentId, usize> = agents.iter().enumerate().map(|(i, &a)| (a, i)).collect();

        let n = agents.len();
        let mut rates = vec![0.5; n * n];
        let mut games = vec![0u32; n * n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let direct = observed.get(&(agents[i], agents[j]));
                let reverse = observed.get(&(agents[j], agents[i]));
                let (rate, count) = match (direct, reverse) {
                    (Some(&(w, g)), _) => (w as f64 / g as f64, g),
                    (None, Some(&(w, g))) => (1.0 - w as f64 / g as f64, g),
                    (None, None) => (0.5, 0),
                };
                rates[i * n + j] = rate;
                games[i * n + j] = count;
            }
        }

        Self {
            agents,
            index,
            rates,
            games,
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in index order
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    pub fn index_of(&self, agent_id: AgentId) -> Option<usize> {
        self.index.get(&agent_id).copied()
    }

    /// Probability that agent `i` beats agent `j` (by index)
    #[inline]
    pub fn rate(&self, i: usize, j: usize) -> f64 {
        self.rates[i * self.agents.len() + j]
    }

    #[inline]
    pub fn games(&self, i: usize, j: usize) -> u32 {
        self.games[i * self.agents.len() + j]
    }

    /// Total games of agent `i` across all opponents
    pub fn total_games(&self, i: usize) -> u32 {
        (0..self.len()).filter(|&j| j != i).map(|j| self.games(i, j)).sum()
    }

    /// Expected wins of agent `i` implied by the rates and game counts
    pub fn total_wins(&self, i: usize) -> f64 {
        (0..self.len())
            .filter(|&j| j != i)
            .map(|j| self.rate(i, j) * self.games(i, j) as f64)
            .sum()
    }

    /// Total wins over total games; 0 for an agent without games
    pub fn weighted_win_rate(&self, i: usize) -> f64 {
        let games = self.total_games(i);
        if games == 0 {
            0.0
        } else {
            self.total_wins(i) / games as f64
        }
    }
}
