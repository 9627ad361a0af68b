//! Ratings commands - incremental update, rebuild, show
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - dispatch
//! - Level 2: update(), rebuild(), show()
//! - Level 4: table formatting

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use rustc_hash::FxHashMap;

use league_core::{AgentId, Rating};
use league_rank::ReplayOrder;

use crate::config::Context;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Subcommand)]
pub enum RatingsCommand {
    /// Apply decisive matches recorded since the last update
    Update,
    /// Recompute ratings by replaying the whole match log
    Rebuild(RebuildArgs),
    /// Print the league's ratings
    Show(ShowArgs),
}

#[derive(Args)]
pub struct RebuildArgs {
    /// Delete existing ratings and start every agent from the prior
    #[arg(long)]
    pub reset: bool,

    /// Replay order: "time" (finished_at, then id) or "id"
    #[arg(long, default_value = "time")]
    pub order: ReplayOrder,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(ctx: &Context, command: RatingsCommand) -> Result<()> {
    match command {
        RatingsCommand::Update => update(ctx),
        RatingsCommand::Rebuild(args) => rebuild(ctx, &args),
        RatingsCommand::Show(args) => show(ctx, &args),
    }
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn update(ctx: &Context) -> Result<()> {
    let store = ctx.open_league()?;
    let processed = store
        .update(ctx.league_id())
        .with_context(|| format!("Failed to update league {}", ctx.league_id()))?;
    println!("Processed {} new match(es) in league {}", processed, ctx.league_id());
    Ok(())
}

fn rebuild(ctx: &Context, args: &RebuildArgs) -> Result<()> {
    let store = ctx.open_league()?;
    let report = store
        .rebuild(ctx.league_id(), args.reset, args.order)
        .with_context(|| format!("Failed to rebuild league {}", ctx.league_id()))?;

    if report.is_degenerate() {
        println!("No decisive matches in league {}; nothing to replay", ctx.league_id());
        return Ok(());
    }
    println!(
        "Rebuilt league {} ({} order{}): {} match(es), {} agent(s) rated, cursor at {}",
        ctx.league_id(),
        report.order,
        if report.reset { ", reset" } else { "" },
        report.processed,
        report.agents_rated,
        report.last_match_id
    );
    Ok(())
}

fn show(ctx: &Context, args: &ShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let ratings = store.ratings(ctx.league_id())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ratings)?);
        return Ok(());
    }
    if ratings.is_empty() {
        println!("No ratings in league {}", ctx.league_id());
        return Ok(());
    }

    let names: FxHashMap<AgentId, String> = store
        .agents()?
        .into_iter()
        .map(|a| (a.agent_id, a.name))
        .collect();
    print!("{}", format_table(&ratings, &names));
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn format_table(ratings: &[Rating], names: &FxHashMap<AgentId, String>) -> String {
    let mut out = format!(
        "{:>4}  {:<24} {:>8} {:>8} {:>9}\n",
        "#", "agent", "mu", "sigma", "mu-3sigma"
    );
    for (i, rating) in ratings.iter().enumerate() {
        let name = names
            .get(&rating.agent_id)
            .cloned()
            .unwrap_or_else(|| format!("agent-{}", rating.agent_id));
        out.push_str(&format!(
            "{:>4}  {:<24} {:>8.3} {:>8.3} {:>9.3}\n",
            i + 1,
            name,
            rating.mu,
            rating.sigma,
            rating.conservative()
        ));
    }
    out
}
