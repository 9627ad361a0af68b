//! League Store - SQLite persistence and transactional league operations
//!
//! This crate owns all persisted league state:
//! - League settings and the rating cursor
//! - Agent registry, league entrants and the append-only match log
//! - Incremental rating updates and full rebuilds
//! - Snapshot reads for ranking, matchups and scheduling
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: update, rebuild (orchestration)
//! - Level 2: settings, registry, match log, read views (phases)
//! - Level 3: row mapping and SQL steps
//! - Level 4: schema

mod processor;
mod queries;
mod rows;
mod schema;
mod store;

pub use processor::RebuildReport;
pub use store::{SeriesRecord, SqliteStore};
