//! Head-to-head matchup statistics
//!
//! Level 2 - Phases

use rustc_hash::FxHashMap;
use serde::Serialize;

use league_core::{AgentId, Match};

/// One agent's record against one opponent
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpponentRecord {
    pub opponent_id: AgentId,
    pub opponent_name: String,
    pub wins: u32,
    pub losses: u32,
    pub games: u32,
    pub win_rate: f64,
}

/// All head-to-head records of one agent plus its averages
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentMatchups {
    pub agent_id: AgentId,
    pub name: String,
    /// Most-played opponents first, then by name
    pub opponents: Vec<OpponentRecord>,
    pub total_wins: u32,
    pub total_games: u32,
    /// Total wins over total games
    pub weighted_win_rate: f64,
    /// Mean of the per-opponent win rates
    pub unweighted_win_rate: f64,
}

/// Tally decisive matches into per-agent matchup tables.
///
/// The result is ordered by weighted win rate desc, total games desc, name asc.
pub fn matchups<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
    names: &FxHashMap<AgentId, String>,
) -> Vec<AgentMatchups> {
    // (agent, opponent) -> (wins, losses)
    let mut tally: FxHashMap<AgentId, FxHashMap<AgentId, (u32, u32)>> = FxHashMap::default();
    for m in matches {
        let Some(outcome) = m.outcome() else {
            continue;
        };
        tally.entry(outcome.winner).or_default().entry(outcome.loser).or_default().0 += 1;
        tally.entry(outcome.loser).or_default().entry(outcome.winner).or_default().1 += 1;
    }

    let name_of = |id: AgentId| names.get(&id).cloned().unwrap_or_else(|| format!("agent-{}", id));

    let mut summary: Vec<AgentMatchups> = tally
        .into_iter()
        .map(|(agent_id, opponents)| {
            let mut rows: Vec<OpponentRecord> = opponents
                .into_iter()
                .map(|(opponent_id, (wins, losses))| {
                    let games = wins + losses;
                    OpponentRecord {
                        opponent_id,
                        opponent_name: name_of(opponent_id),
                        wins,
                        losses,
                        games,
                        win_rate: wins as f64 / games as f64,
                    }
                })
                .collect();
            rows.sort_by(|a, b| {
                b.games
                    .cmp(&a.games)
                    .then_with(|| a.opponent_name.cmp(&b.opponent_name))
                    .then_with(|| a.opponent_id.cmp(&b.opponent_id))
            });

            let total_wins: u32 = rows.iter().map(|r| r.wins).sum();
            let total_games: u32 = rows.iter().map(|r| r.games).sum();
            let weighted_win_rate = if total_games > 0 {
                total_wins as f64 / total_games as f64
            } else {
                0.0
            };
            let unweighted_win_rate = if rows.is_empty() {
                0.0
            } else {
                rows.iter().map(|r| r.win_rate).sum::<f64>() / rows.len() as f64
            };

            AgentMatchups {
                agent_id,
                name: name_of(agent_id),
                opponents: rows,
                total_wins,
                total_games,
                weighted_win_rate,
                unweighted_win_rate,
            }
        })
        .collect();

    summary.sort_by(|a, b| {
        b.weighted_win_rate
            .total_cmp(&a.weighted_win_rate)
            .then_with(|| b.total_games.cmp(&a.total_games))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: i64, p1: AgentId, p2: AgentId, winner: Option<AgentId>) -> Match {
        Match {
            match_id: id,
            league_id: 1,
            player1_id: p1,
            player2_id: p2,
            winner_id: winner,
            started_at: None,
            finished_at: None,
            game_params: Default::default(),
        }
    }

    fn names() -> FxHashMap<AgentId, String> {
        [(1, "ada"), (2, "bob"), (3, "cy")]
            .into_iter()
            .map(|(id, n)| (id, n.to_string()))
            .collect()
    }

    #[test]
    fn test_weighted_and_unweighted_averages() {
        // ada: 3-1 vs bob, 0-1 vs cy
        let matches = vec![
            game(1, 1, 2, Some(1)),
            game(2, 1, 2, Some(1)),
            game(3, 2, 1, Some(1)),
            game(4, 2, 1, Some(2)),
            game(5, 1, 3, Some(3)),
        ];
        let table = matchups(&matches, &names());
        let ada = table.iter().find(|a| a.agent_id == 1).unwrap();

        assert_eq!(ada.total_games, 5);
        assert_eq!(ada.total_wins, 3);
        assert!((ada.weighted_win_rate - 0.6).abs() < 1e-12);
        assert!((ada.unweighted_win_rate - 0.375).abs() < 1e-12);
        assert_eq!(ada.opponents[0].opponent_name, "bob");
        assert_eq!(ada.opponents[0].games, 4);
    }

    #[test]
    fn test_summary_order() {
        let matches = vec![game(1, 1, 2, Some(1)), game(2, 3, 2, Some(3)), game(3, 1, 3, Some(3))];
        let table = matchups(&matches, &names());
        let order: Vec<&str> = table.iter().map(|a| a.name.as_str()).collect();
        // ada 0.5 (2 games), cy 1.0 (2 games), bob 0.0
        assert_eq!(order, vec!["cy", "ada", "bob"]);
    }

    #[test]
    fn test_skips_undecided_and_self_play() {
        let matches = vec![game(1, 1, 2, None), game(2, 3, 3, Some(3))];
        assert!(matchups(&matches, &names()).is_empty());
    }
}
