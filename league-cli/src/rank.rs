//! Ranking commands - AlphaRank and head-to-head matchups
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_rank(), run_matchups()
//! - Level 2: alpharank_config()
//! - Level 4: report formatting

use anyhow::{Context as _, Result};
use clap::Args;

use league_rank::{AgentMatchups, AlphaRankConfig, AlphaRankOutcome, AlphaRanking};

use crate::config::Context;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct RankArgs {
    /// Selection intensity (default from config, else 100)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Weight of non-improving deviations (default from config, else 1e-6)
    #[arg(long)]
    pub mutation: Option<f64>,

    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MatchupsArgs {
    /// Output JSON instead of a report
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run_rank(ctx: &Context, args: RankArgs) -> Result<()> {
    let config = alpharank_config(&ctx.config.alpharank, &args)?;
    let store = ctx.open_store()?;
    let outcome = store
        .rank(ctx.league_id(), &config)
        .with_context(|| format!("Failed to rank league {}", ctx.league_id()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match &outcome {
        AlphaRankOutcome::NotEnoughAgents { agents } => {
            println!(
                "League {} has {} agent(s) with decisive results; AlphaRank needs at least 2",
                ctx.league_id(),
                agents
            );
        }
        AlphaRankOutcome::Ranked(ranking) => {
            print!("{}", format_ranking(ranking, &config));
        }
    }
    Ok(())
}

pub fn run_matchups(ctx: &Context, args: MatchupsArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let table = store
        .matchups(ctx.league_id())
        .with_context(|| format!("Failed to load matchups for league {}", ctx.league_id()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else if table.is_empty() {
        println!("No decisive matches in league {}", ctx.league_id());
    } else {
        print!("{}", format_matchups(&table));
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Command-line values override the configured defaults
fn alpharank_config(base: &AlphaRankConfig, args: &RankArgs) -> Result<AlphaRankConfig> {
    let mut config = base.clone();
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(mutation) = args.mutation {
        config.mutation = mutation;
    }
    if !(config.alpha.is_finite() && config.alpha >= 0.0) {
        anyhow::bail!("--alpha must be a non-negative number, got {}", config.alpha);
    }
    if !(config.mutation.is_finite() && config.mutation >= 0.0) {
        anyhow::bail!("--mutation must be a non-negative number, got {}", config.mutation);
    }
    Ok(config)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn format_ranking(ranking: &AlphaRanking, config: &AlphaRankConfig) -> String {
    let mut out = format!(
        "AlphaRank (alpha={}, mutation={}): {} iteration(s){}\n",
        config.alpha,
        config.mutation,
        ranking.iterations,
        if ranking.converged { "" } else { ", NOT converged" }
    );
    out.push_str(&format!(
        "{:>4}  {:<24} {:>10} {:>7} {:>7} {:>8}\n",
        "#", "agent", "mass", "games", "wins", "win%"
    ));
    for (i, agent) in ranking.agents.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<24} {:>10.6} {:>7} {:>7.1} {:>7.1}%\n",
            i + 1,
            agent.name,
            agent.mass,
            agent.games,
            agent.wins,
            agent.weighted_win_rate * 100.0
        ));
    }
    out
}

fn format_matchups(table: &[AgentMatchups]) -> String {
    let mut out = String::new();
    for agent in table {
        out.push_str(&format!(
            "{} - {}/{} wins, weighted {:.1}%, unweighted {:.1}%\n",
            agent.name,
            agent.total_wins,
            agent.total_games,
            agent.weighted_win_rate * 100.0,
            agent.unweighted_win_rate * 100.0
        ));
        for record in &agent.opponents {
            out.push_str(&format!(
                "    vs {:<24} {:>4}-{:<4} {:>6.1}%\n",
                record.opponent_name,
                record.wins,
                record.losses,
                record.win_rate * 100.0
            ));
        }
    }
    out
}
