//! League Rank - Ratings replay, meta-game ranking and scheduling
//!
//! This crate provides the pure computations over a league snapshot:
//! - Replaying decisive matches into ratings
//! - Head-to-head win rates and matchup tables
//! - AlphaRank over ordered agent profiles
//! - Choosing the next pair to play
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: alpharank (orchestration)
//! - Level 2: stationary_distribution, matchups, pair selection (phases)
//! - Level 3: win-rate matrix, transition weights, priorities (steps)
//! - Level 4: configuration

mod alpharank;
mod config;
mod matchups;
mod matrix;
mod replay;
mod scheduler;

pub use alpharank::{alpharank, AlphaRankOutcome, AlphaRanking, ProfileMass, RankedAgent};
pub use config::{AlphaRankConfig, SchedulerConfig, SchedulerKind, SchedulerWeights};
pub use matchups::{matchups, AgentMatchups, OpponentRecord};
pub use matrix::{DirectionalRecord, WinRateMatrix};
pub use replay::{RatingLedger, ReplayOrder};
pub use scheduler::{selector_for, AdaptiveScheduler, AgentStat, LeagueSnapshot, PairSelector, UniformRandom};
