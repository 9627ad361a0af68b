//! Error type shared by every league crate

use crate::types::{AgentId, LeagueId};

/// Errors produced by league operations
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("Invalid match: {0}")]
    InvalidMatch(String),

    #[error("Invalid league settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Unknown league: {0}")]
    UnknownLeague(LeagueId),

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("League {0} was updated concurrently; no changes were applied")]
    ConcurrentUpdate(LeagueId),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LeagueError>;
