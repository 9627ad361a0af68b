//! Match commands - append finished games to the log
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - dispatch
//! - Level 2: record(), series()
//! - Level 4: parse_params()

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use league_core::NewMatch;

use crate::agent::resolve_agent;
use crate::config::Context;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Subcommand)]
pub enum MatchCommand {
    /// Record one game
    Record(RecordArgs),
    /// Record a series as one row per won game
    Series(SeriesArgs),
}

#[derive(Args)]
pub struct RecordArgs {
    /// First player (id or name)
    #[arg(long)]
    pub p1: String,

    /// Second player (id or name)
    #[arg(long)]
    pub p2: String,

    /// Winner (id or name); omit for a draw or an abandoned game
    #[arg(long)]
    pub winner: Option<String>,

    /// Game parameters as a JSON document
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
}

#[derive(Args)]
pub struct SeriesArgs {
    /// First player (id or name)
    #[arg(long)]
    pub a: String,

    /// Second player (id or name)
    #[arg(long)]
    pub b: String,

    #[arg(long, default_value = "0")]
    pub wins_a: u32,

    #[arg(long, default_value = "0")]
    pub wins_b: u32,

    /// Drawn games; counted but not stored
    #[arg(long, default_value = "0")]
    pub draws: u32,

    /// Game parameters as a JSON document
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(ctx: &Context, command: MatchCommand) -> Result<()> {
    match command {
        MatchCommand::Record(args) => record(ctx, &args),
        MatchCommand::Series(args) => series(ctx, &args),
    }
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn record(ctx: &Context, args: &RecordArgs) -> Result<()> {
    let store = ctx.open_league()?;
    let player1_id = resolve_agent(&store, &args.p1)?;
    let player2_id = resolve_agent(&store, &args.p2)?;
    let winner_id = args
        .winner
        .as_deref()
        .map(|w| resolve_agent(&store, w))
        .transpose()?;

    let now = Utc::now();
    let game = NewMatch {
        league_id: ctx.league_id(),
        player1_id,
        player2_id,
        winner_id,
        started_at: Some(now),
        finished_at: Some(now),
        game_params: parse_params(args.params.as_deref())?,
    };
    let match_id = store.record_match(&game).context("Failed to record match")?;
    println!("Recorded match {} in league {}", match_id, ctx.league_id());
    Ok(())
}

fn series(ctx: &Context, args: &SeriesArgs) -> Result<()> {
    let store = ctx.open_league()?;
    let a = resolve_agent(&store, &args.a)?;
    let b = resolve_agent(&store, &args.b)?;
    let params = parse_params(args.params.as_deref())?;

    let record = store
        .record_series(ctx.league_id(), a, b, args.wins_a, args.wins_b, args.draws, params)
        .context("Failed to record series")?;
    println!(
        "Recorded {} decisive game(s) in league {} ({} draw(s) not stored)",
        record.match_ids.len(),
        ctx.league_id(),
        record.draws
    );
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_params(raw: Option<&str>) -> Result<serde_json::Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("--params must be valid JSON"),
        None => Ok(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert_eq!(parse_params(None).unwrap(), serde_json::Value::Null);
        let value = parse_params(Some(r#"{"board": 8}"#)).unwrap();
        assert_eq!(value["board"], 8);
        assert!(parse_params(Some("{not json")).is_err());
    }
}
