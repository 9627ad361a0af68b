//! AlphaRank over ordered agent profiles
//!
//! Level 1 - Orchestration and Level 2 - Phases
//!
//! States of the chain are ordered profiles `(i, j)` with `i != j`. From a
//! profile the row player may switch to any other agent `k`, and so may the
//! column player. Improving switches are weighted `exp(min(50, alpha * delta))`,
//! all others get the `mutation` weight, and every profile keeps a self-loop
//! of weight 1. Agent mass is half the stationary mass of every profile the
//! agent appears in.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use league_core::AgentId;

use crate::config::AlphaRankConfig;
use crate::matrix::WinRateMatrix;

/// Cap on the exponent of an improving transition weight
const MAX_EXPONENT: f64 = 50.0;

/// One agent in the ranking
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedAgent {
    pub agent_id: AgentId,
    pub name: String,
    pub mass: f64,
    pub games: u32,
    pub wins: f64,
    pub weighted_win_rate: f64,
}

/// Stationary mass of one ordered profile
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProfileMass {
    pub row: AgentId,
    pub col: AgentId,
    pub mass: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlphaRanking {
    /// Ordered by mass desc, weighted win rate desc, name asc
    pub agents: Vec<RankedAgent>,
    /// In profile index order
    pub profiles: Vec<ProfileMass>,
    pub iterations: usize,
    pub converged: bool,
}

impl AlphaRanking {
    pub fn mass_of(&self, agent_id: AgentId) -> Option<f64> {
        self.agents.iter().find(|a| a.agent_id == agent_id).map(|a| a.mass)
    }

    pub fn top(&self) -> Option<&RankedAgent> {
        self.agents.first()
    }
}

/// Result of ranking a league
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlphaRankOutcome {
    /// Fewer than two agents have decisive results
    NotEnoughAgents { agents: usize },
    Ranked(AlphaRanking),
}

impl AlphaRankOutcome {
    pub fn ranking(&self) -> Option<&AlphaRanking> {
        match self {
            AlphaRankOutcome::Ranked(r) => Some(r),
            AlphaRankOutcome::NotEnoughAgents { .. } => None,
        }
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Rank the agents of a win-rate matrix.
///
/// `names` supplies display names; agents without one are shown as `agent-<id>`.
pub fn alpharank(
    matrix: &WinRateMatrix,
    names: &FxHashMap<AgentId, String>,
    config: &AlphaRankConfig,
) -> AlphaRankOutcome {
    let n = matrix.len();
    if n < 2 {
        return AlphaRankOutcome::NotEnoughAgents { agents: n };
    }

    let chain = build_chain(matrix, config);
    let stationary = stationary_distribution(&chain, config);
    let mass = aggregate_agent_mass(n, &stationary.distribution);

    let mut agents: Vec<RankedAgent> = (0..n)
        .map(|i| {
            let agent_id = matrix.agents()[i];
            RankedAgent {
                agent_id,
                name: names
                    .get(&agent_id)
                    .cloned()
                    .unwrap_or_else(|| format!("agent-{}", agent_id)),
                mass: mass[i],
                games: matrix.total_games(i),
                wins: matrix.total_wins(i),
                weighted_win_rate: matrix.weighted_win_rate(i),
            }
        })
        .collect();
    sort_ranked(&mut agents);

    let profiles = stationary
        .distribution
        .iter()
        .enumerate()
        .map(|(s, &m)| {
            let (i, j) = profile_agents(s, n);
            ProfileMass {
                row: matrix.agents()[i],
                col: matrix.agents()[j],
                mass: m,
            }
        })
        .collect();

    AlphaRankOutcome::Ranked(AlphaRanking {
        agents,
        profiles,
        iterations: stationary.iterations,
        converged: stationary.converged,
    })
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Row-stochastic chain stored by incoming edges, sources ascending
pub(crate) struct ProfileChain {
    incoming: Vec<Vec<(usize, f64)>>,
}

impl ProfileChain {
    pub(crate) fn num_states(&self) -> usize {
        self.incoming.len()
    }

    /// Sum of outgoing probabilities of every state (each should be 1)
    #[cfg(test)]
    fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.num_states()];
        for edges in &self.incoming {
            for &(src, p) in edges {
                sums[src] += p;
            }
        }
        sums
    }
}

/// Build the transition structure for all `n * (n - 1)` profiles
pub(crate) fn build_chain(matrix: &WinRateMatrix, config: &AlphaRankConfig) -> ProfileChain {
    let n = matrix.len();
    let states = n * (n - 1);

    let rows: Vec<Vec<(usize, f64)>> = if config.parallel {
        (0..states)
            .into_par_iter()
            .map(|s| outgoing_transitions(matrix, s, config))
            .collect()
    } else {
        (0..states).map(|s| outgoing_transitions(matrix, s, config)).collect()
    };

    let mut incoming: Vec<Vec<(usize, f64)>> = vec![Vec::new(); states];
    for (src, row) in rows.into_iter().enumerate() {
        for (dst, p) in row {
            incoming[dst].push((src, p));
        }
    }

    ProfileChain { incoming }
}

pub(crate) struct Stationary {
    pub distribution: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Synchronous power iteration from the uniform distribution
pub(crate) fn stationary_distribution(chain: &ProfileChain, config: &AlphaRankConfig) -> Stationary {
    let states = chain.num_states();
    let uniform = 1.0 / states as f64;
    let mut pi = vec![uniform; states];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut next: Vec<f64> = if config.parallel {
            chain.incoming.par_iter().map(|edges| gather(edges, &pi)).collect()
        } else {
            chain.incoming.iter().map(|edges| gather(edges, &pi)).collect()
        };
        renormalize(&mut next, uniform);

        let delta: f64 = next.iter().zip(&pi).map(|(a, b)| (a - b).abs()).sum();
        pi = next;
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    Stationary {
        distribution: pi,
        iterations,
        converged,
    }
}

/// Per-agent share: half of every profile the agent plays in, renormalized
pub(crate) fn aggregate_agent_mass(n: usize, distribution: &[f64]) -> Vec<f64> {
    let mut mass = vec![0.0; n];
    for (s, &m) in distribution.iter().enumerate() {
        let (i, j) = profile_agents(s, n);
        mass[i] += 0.5 * m;
        mass[j] += 0.5 * m;
    }
    renormalize(&mut mass, 1.0 / n as f64);
    mass
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Index of profile `(i, j)`, `i != j`
#[inline]
pub(crate) fn profile_index(i: usize, j: usize, n: usize) -> usize {
    i * (n - 1) + if j < i { j } else { j - 1 }
}

/// Inverse of [`profile_index`]
#[inline]
pub(crate) fn profile_agents(s: usize, n: usize) -> (usize, usize) {
    let i = s / (n - 1);
    let r = s % (n - 1);
    let j = if r < i { r } else { r + 1 };
    (i, j)
}

fn transition_weight(delta: f64, config: &AlphaRankConfig) -> f64 {
    if delta > 0.0 {
        (config.alpha * delta).min(MAX_EXPONENT).exp()
    } else {
        config.mutation
    }
}

/// Normalized outgoing edges of profile `s`, targets ascending
fn outgoing_transitions(matrix: &WinRateMatrix, s: usize, config: &AlphaRankConfig) -> Vec<(usize, f64)> {
    let n = matrix.len();
    let (i, j) = profile_agents(s, n);
    let mut edges = Vec::with_capacity(1 + 2 * (n - 2));
    edges.push((s, 1.0));

    for k in 0..n {
        if k == i || k == j {
            continue;
        }
        // Row player i switches to k against the same column j
        let w = transition_weight(matrix.rate(k, j) - matrix.rate(i, j), config);
        if w > 0.0 {
            edges.push((profile_index(k, j, n), w));
        }
        // Column player j switches to k against the same row i
        let w = transition_weight(matrix.rate(k, i) - matrix.rate(j, i), config);
        if w > 0.0 {
            edges.push((profile_index(i, k, n), w));
        }
    }

    let total: f64 = edges.iter().map(|&(_, w)| w).sum();
    for edge in &mut edges {
        edge.1 /= total;
    }
    edges.sort_by_key(|&(dst, _)| dst);
    edges
}

#[inline]
fn gather(edges: &[(usize, f64)], pi: &[f64]) -> f64 {
    edges.iter().map(|&(src, p)| pi[src] * p).sum()
}

/// Scale to sum 1; fall back to `fill` everywhere if the mass vanished
fn renormalize(values: &mut [f64], fill: f64) {
    let total: f64 = values.iter().sum();
    if total > 0.0 && total.is_finite() {
        for v in values.iter_mut() {
            *v /= total;
        }
    } else {
        values.fill(fill);
    }
}

/// Mass desc, weighted win rate desc, name (case-insensitive) asc
fn sort_ranked(agents: &mut [RankedAgent]) {
    agents.sort_by(|a, b| {
        b.mass
            .total_cmp(&a.mass)
            .then_with(|| b.weighted_win_rate.total_cmp(&a.weighted_win_rate))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DirectionalRecord;

    fn matrix_from(rates: &[(AgentId, AgentId, u32, u32)]) -> WinRateMatrix {
        WinRateMatrix::from_records(rates.iter().map(|&(row, col, wins, games)| DirectionalRecord {
            row,
            col,
            wins,
            games,
        }))
    }

    #[test]
    fn test_profile_index_round_trip() {
        for n in 2..6 {
            let mut seen = vec![false; n * (n - 1)];
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let s = profile_index(i, j, n);
                    assert!(!seen[s]);
                    seen[s] = true;
                    assert_eq!(profile_agents(s, n), (i, j));
                }
            }
            assert!(seen.into_iter().all(|x| x));
        }
    }

    #[test]
    fn test_chain_rows_are_stochastic() {
        let matrix = matrix_from(&[(1, 2, 7, 10), (2, 3, 2, 10), (1, 3, 5, 10), (3, 4, 9, 10)]);
        let chain = build_chain(&matrix, &AlphaRankConfig::default().sequential());
        assert_eq!(chain.num_states(), 12);
        for sum in chain.row_sums() {
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_two_agents_settle_on_winner() {
        let matrix = matrix_from(&[(1, 2, 9, 10)]);
        let outcome = alpharank(&matrix, &FxHashMap::default(), &AlphaRankConfig::default());
        let ranking = outcome.ranking().unwrap();
        // Two agents have no third strategy to switch to, so both profiles keep equal mass
        assert!((ranking.agents[0].mass - 0.5).abs() < 1e-12);
        assert!((ranking.agents[1].mass - 0.5).abs() < 1e-12);
        // Weighted win rate breaks the tie
        assert_eq!(ranking.agents[0].agent_id, 1);
        assert_eq!(ranking.agents[0].name, "agent-1");
    }

    #[test]
    fn test_dominant_agent_ranks_first() {
        let matrix = matrix_from(&[(1, 2, 8, 10), (1, 3, 8, 10), (2, 3, 5, 10)]);
        let mut names = FxHashMap::default();
        names.insert(1, "alpha".to_string());
        names.insert(2, "beta".to_string());
        names.insert(3, "gamma".to_string());

        let outcome = alpharank(&matrix, &names, &AlphaRankConfig::default());
        let ranking = outcome.ranking().unwrap();
        assert_eq!(ranking.top().unwrap().name, "alpha");
        assert!(ranking.mass_of(1).unwrap() > ranking.mass_of(2).unwrap());
        assert!(ranking.mass_of(1).unwrap() > ranking.mass_of(3).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let matrix = matrix_from(&[
            (1, 2, 6, 10),
            (2, 3, 7, 10),
            (3, 1, 6, 10),
            (1, 4, 3, 10),
            (4, 5, 9, 10),
            (5, 2, 4, 10),
        ]);
        let names = FxHashMap::default();
        let par = alpharank(&matrix, &names, &AlphaRankConfig::default());
        let seq = alpharank(&matrix, &names, &AlphaRankConfig::default().sequential());
        assert_eq!(par, seq);
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let matrix = matrix_from(&[(1, 2, 8, 10), (2, 3, 8, 10), (3, 1, 8, 10)]);
        let config = AlphaRankConfig::default().with_max_iterations(1).with_tolerance(0.0);
        let ranking = alpharank(&matrix, &FxHashMap::default(), &config);
        let ranking = ranking.ranking().unwrap();
        assert_eq!(ranking.iterations, 1);
        assert!(!ranking.converged);
    }

    #[test]
    fn test_not_enough_agents() {
        let empty = matrix_from(&[]);
        assert_eq!(
            alpharank(&empty, &FxHashMap::default(), &AlphaRankConfig::default()),
            AlphaRankOutcome::NotEnoughAgents { agents: 0 }
        );
    }

    #[test]
    fn test_zero_mutation_keeps_rows_finite() {
        let matrix = matrix_from(&[(1, 2, 5, 10), (2, 3, 5, 10), (1, 3, 5, 10)]);
        let config = AlphaRankConfig::new(100.0, 0.0);
        let ranking = alpharank(&matrix, &FxHashMap::default(), &config);
        let ranking = ranking.ranking().unwrap();
        let total: f64 = ranking.agents.iter().map(|a| a.mass).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
