//! League CLI - Command-line interface
//!
//! Commands:
//! - ratings: incremental update, full rebuild, show
//! - rank: AlphaRank over head-to-head win rates
//! - matchups: per-agent head-to-head records
//! - next-pair: ask the scheduler for the next game
//! - agent / match / settings: manage the league
//! - serve: start the HTTP API

mod agent;
mod config;
mod match_cmd;
mod rank;
mod ratings;
mod schedule;
mod server;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use league_core::LeagueId;

use crate::config::Context;

#[derive(Parser)]
#[command(name = "league", version)]
#[command(about = "Ratings, rankings and matchmaking for game-playing agents")]
struct Cli {
    /// Config file (default: $LEAGUE_CONFIG, then ./league.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database (overrides config and $LEAGUE_DB)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// League id (overrides config and $LEAGUE_ID)
    #[arg(long, global = true)]
    league: Option<LeagueId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update, rebuild or show TrueSkill ratings
    #[command(subcommand)]
    Ratings(ratings::RatingsCommand),
    /// Rank agents with AlphaRank
    Rank(rank::RankArgs),
    /// Show head-to-head records
    Matchups(rank::MatchupsArgs),
    /// Choose the next pair to play
    NextPair(schedule::NextPairArgs),
    /// Register and list agents
    #[command(subcommand)]
    Agent(agent::AgentCommand),
    /// Record finished games
    #[command(subcommand)]
    Match(match_cmd::MatchCommand),
    /// Show or change league settings
    #[command(subcommand)]
    Settings(settings::SettingsCommand),
    /// Start the HTTP API
    Serve(server::ServerArgs),
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let file = config::load(cli.config.as_deref())?;
    let ctx = Context::new(file.with_flags(cli.db, cli.league));

    match cli.command {
        Commands::Ratings(command) => ratings::run(&ctx, command),
        Commands::Rank(args) => rank::run_rank(&ctx, args),
        Commands::Matchups(args) => rank::run_matchups(&ctx, args),
        Commands::NextPair(args) => schedule::run(&ctx, args),
        Commands::Agent(command) => agent::run(&ctx, command),
        Commands::Match(command) => match_cmd::run(&ctx, command),
        Commands::Settings(command) => settings::run(&ctx, command),
        Commands::Serve(args) => server::run(&ctx, args),
    }
}

/// Log to stderr so JSON output on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["league", "ratings", "rebuild", "--reset", "--order", "id", "--league", "3"]).unwrap();
        assert_eq!(cli.league, Some(3));
        match cli.command {
            Commands::Ratings(ratings::RatingsCommand::Rebuild(args)) => {
                assert!(args.reset);
                assert_eq!(args.order, league_rank::ReplayOrder::Id);
            }
            _ => panic!("expected ratings rebuild"),
        }
    }

    #[test]
    fn test_rebuild_defaults_to_time_order() {
        let cli = Cli::try_parse_from(["league", "ratings", "rebuild"]).unwrap();
        match cli.command {
            Commands::Ratings(ratings::RatingsCommand::Rebuild(args)) => {
                assert!(!args.reset);
                assert_eq!(args.order, league_rank::ReplayOrder::Time);
            }
            _ => panic!("expected ratings rebuild"),
        }
    }

    #[test]
    fn test_rejects_unknown_order() {
        assert!(Cli::try_parse_from(["league", "ratings", "rebuild", "--order", "random"]).is_err());
    }
}
