//! League Core - Domain model and skill updates
//!
//! This crate provides the pure building blocks of the league:
//! - Agent, match and rating records
//! - Per-league hyperparameters and the processing cursor
//! - Gaussian skill models (TrueSkill-style and Weng-Lin)
//! - The shared error type
//!
//! Nothing here touches a database, the network or the clock.

pub mod error;
pub mod settings;
pub mod skill;
pub mod types;

// Re-exports for convenient access
pub use error::{LeagueError, Result};
pub use settings::{LeagueSettings, SettingsOverrides, SkillModelKind};
pub use skill::{Skill, SkillModel, TrueSkill, WengLin, SIGMA_FLOOR};
pub use types::{Agent, AgentId, LeagueId, Match, MatchId, NewMatch, Outcome, Rating};
