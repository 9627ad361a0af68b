//! Agent commands - registration and listing

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use league_core::{AgentId, LeagueError};
use league_store::SqliteStore;

use crate::config::Context;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent (no-op if the name exists)
    Add(AddArgs),
    /// List registered agents, marking entrants of the league
    List,
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,

    /// Also enter the agent into the league
    #[arg(long)]
    pub enter: bool,
}

pub fn run(ctx: &Context, command: AgentCommand) -> Result<()> {
    match command {
        AgentCommand::Add(args) => add(ctx, &args),
        AgentCommand::List => list(ctx),
    }
}

fn add(ctx: &Context, args: &AddArgs) -> Result<()> {
    let store = if args.enter { ctx.open_league()? } else { ctx.open_store()? };
    let agent = store
        .register_agent(&args.name)
        .with_context(|| format!("Failed to register '{}'", args.name))?;
    println!("{} -> agent {}", agent.name, agent.agent_id);

    if args.enter {
        let added = store.enter_league(ctx.league_id(), agent.agent_id)?;
        if added {
            println!("Entered league {}", ctx.league_id());
        } else {
            println!("Already in league {}", ctx.league_id());
        }
    }
    Ok(())
}

fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let agents = store.agents()?;
    if agents.is_empty() {
        println!("No agents registered");
        return Ok(());
    }
    let entrants = store.entrants(ctx.league_id())?;
    for agent in agents {
        let marker = if entrants.contains(&agent.agent_id) { "*" } else { " " };
        println!(
            "{} {:>5}  {:<24} {}",
            marker,
            agent.agent_id,
            agent.name,
            agent.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Accept a registered name or a numeric agent id.
///
/// An exact name match wins, so agents named with digits stay reachable.
pub fn resolve_agent(store: &SqliteStore, reference: &str) -> Result<AgentId> {
    let reference = reference.trim();
    if let Some(agent) = store.agent_by_name(reference)? {
        return Ok(agent.agent_id);
    }
    let Ok(id) = reference.parse::<AgentId>() else {
        anyhow::bail!("No agent named '{}'", reference);
    };
    match store.agent(id) {
        Ok(agent) => Ok(agent.agent_id),
        Err(LeagueError::UnknownAgent(_)) => anyhow::bail!("No agent with id or name '{}'", reference),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_agent_by_id_or_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let agent = store.register_agent("greedy").unwrap();
        let id = agent.agent_id.to_string();

        assert_eq!(resolve_agent(&store, "greedy").unwrap(), agent.agent_id);
        assert_eq!(resolve_agent(&store, &format!(" {} ", id)).unwrap(), agent.agent_id);
        assert!(resolve_agent(&store, "missing").is_err());
        assert!(resolve_agent(&store, "42").is_err());
    }

    #[test]
    fn test_numeric_name_resolves_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.register_agent("alpha").unwrap();
        let numeric = store.register_agent("2048").unwrap();
        let shadowed = store.register_agent(&first.agent_id.to_string()).unwrap();

        assert_eq!(resolve_agent(&store, "2048").unwrap(), numeric.agent_id);
        // A name equal to another agent's id refers to the named agent
        assert_eq!(resolve_agent(&store, &first.agent_id.to_string()).unwrap(), shadowed.agent_id);
        assert_eq!(resolve_agent(&store, &numeric.agent_id.to_string()).unwrap(), numeric.agent_id);
    }
}
