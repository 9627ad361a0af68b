//! Agents, matches and ratings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};
use crate::skill::Skill;

pub type AgentId = i64;
pub type LeagueId = i64;
pub type MatchId = i64;

/// A registered agent. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Winner and loser of a decisive game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub winner: AgentId,
    pub loser: AgentId,
}

/// One recorded game. Append-only: never updated or deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: MatchId,
    pub league_id: LeagueId,
    pub player1_id: AgentId,
    pub player2_id: AgentId,
    /// Nullable at the storage layer; rows without a winner are ignored.
    pub winner_id: Option<AgentId>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_params: serde_json::Value,
}

impl Match {
    /// Winner and loser if this match counts for ratings and rankings.
    ///
    /// Returns `None` for undecided games, self-play and rows whose winner
    /// is not one of the two players.
    pub fn outcome(&self) -> Option<Outcome> {
        let winner = self.winner_id?;
        if self.player1_id == self.player2_id {
            return None;
        }
        if winner == self.player1_id {
            Some(Outcome { winner, loser: self.player2_id })
        } else if winner == self.player2_id {
            Some(Outcome { winner, loser: self.player1_id })
        } else {
            None
        }
    }

    pub fn is_decisive(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn involves(&self, agent_id: AgentId) -> bool {
        self.player1_id == agent_id || self.player2_id == agent_id
    }

    /// Best available "last played" time: finish time, else start time
    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.or(self.started_at)
    }
}

/// A match as submitted by the executor, before it has an id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub league_id: LeagueId,
    pub player1_id: AgentId,
    pub player2_id: AgentId,
    pub winner_id: Option<AgentId>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_params: serde_json::Value,
}

impl NewMatch {
    /// Decisive match between two players, timestamps left empty
    pub fn decisive(league_id: LeagueId, player1_id: AgentId, player2_id: AgentId, winner_id: AgentId) -> Self {
        Self {
            league_id,
            player1_id,
            player2_id,
            winner_id: Some(winner_id),
            started_at: None,
            finished_at: None,
            game_params: serde_json::Value::Null,
        }
    }

    pub fn with_times(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.finished_at = Some(finished_at);
        self
    }

    pub fn with_params(mut self, game_params: serde_json::Value) -> Self {
        self.game_params = game_params;
        self
    }

    /// Reject self-play and winners that did not take part
    pub fn validate(&self) -> Result<()> {
        if self.player1_id == self.player2_id {
            return Err(LeagueError::InvalidMatch(format!(
                "agent {} cannot play itself",
                self.player1_id
            )));
        }
        if let Some(winner) = self.winner_id {
            if winner != self.player1_id && winner != self.player2_id {
                return Err(LeagueError::InvalidMatch(format!(
                    "winner {} is not a participant of {} vs {}",
                    winner, self.player1_id, self.player2_id
                )));
            }
        }
        if let (Some(start), Some(finish)) = (self.started_at, self.finished_at) {
            if finish < start {
                return Err(LeagueError::InvalidMatch(
                    "finished_at is earlier than started_at".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Skill estimate of one agent in one league
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub agent_id: AgentId,
    pub league_id: LeagueId,
    pub mu: f64,
    pub sigma: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rating {
    pub fn new(agent_id: AgentId, league_id: LeagueId, skill: Skill) -> Self {
        Self {
            agent_id,
            league_id,
            mu: skill.mu,
            sigma: skill.sigma,
            updated_at: None,
        }
    }

    pub fn skill(&self) -> Skill {
        Skill::new(self.mu, self.sigma)
    }

    /// Conservative skill estimate (mu - 3 sigma)
    pub fn conservative(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}
