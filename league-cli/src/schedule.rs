//! Next-pair command - ask the scheduler who should play next

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use league_rank::selector_for;

use crate::config::Context;

#[derive(Args)]
pub struct NextPairArgs {
    /// RNG seed for a reproducible choice
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &Context, args: NextPairArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let selector = selector_for(&ctx.config.scheduler);
    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let pair = store
        .next_pair(ctx.league_id(), selector.as_ref(), Utc::now(), &mut rng)
        .with_context(|| format!("Failed to schedule league {}", ctx.league_id()))?;

    if args.json {
        let body = serde_json::json!({
            "league_id": ctx.league_id(),
            "pair": pair.map(|(a, b)| [a, b]),
            "selector": selector.name(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match pair {
        Some((focal, opponent)) => {
            let focal = store.agent(focal)?;
            let opponent = store.agent(opponent)?;
            println!(
                "{} ({}) vs {} ({})",
                focal.name, focal.agent_id, opponent.name, opponent.agent_id
            );
        }
        None => println!("League {} has fewer than two agents to pair", ctx.league_id()),
    }
    Ok(())
}
