//! Settings commands - inspect and change league hyperparameters

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use league_core::{LeagueSettings, SettingsOverrides, SkillModelKind};

use crate::config::Context;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the league's settings
    Show(ShowArgs),
    /// Create the league if needed and change the given values
    Set(SetArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Output JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SetArgs {
    /// Prior mean
    #[arg(long)]
    pub mu0: Option<f64>,

    /// Prior standard deviation
    #[arg(long)]
    pub sigma0: Option<f64>,

    /// Performance noise
    #[arg(long)]
    pub beta: Option<f64>,

    /// Dynamics noise added before every update
    #[arg(long)]
    pub tau: Option<f64>,

    #[arg(long)]
    pub draw_probability: Option<f64>,

    /// Skill model: "true_skill" or "weng_lin"
    #[arg(long)]
    pub model: Option<SkillModelKind>,
}

impl SetArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            mu0: self.mu0,
            sigma0: self.sigma0,
            beta: self.beta,
            tau: self.tau,
            draw_probability: self.draw_probability,
            model: self.model,
        }
    }
}

pub fn run(ctx: &Context, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show(args) => {
            let store = ctx.open_store()?;
            let settings = store
                .settings(ctx.league_id())
                .with_context(|| format!("League {} does not exist yet; use `settings set`", ctx.league_id()))?;
            print_settings(ctx, &settings, args.json)
        }
        SettingsCommand::Set(args) => {
            let store = ctx.open_store()?;
            let settings = store
                .ensure_league(ctx.league_id(), &args.overrides())
                .context("Failed to save settings")?;
            print_settings(ctx, &settings, false)
        }
    }
}

fn print_settings(ctx: &Context, settings: &LeagueSettings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }
    println!("league                   {}", ctx.league_id());
    println!("model                    {:?}", settings.model);
    println!("mu0                      {}", settings.mu0);
    println!("sigma0                   {}", settings.sigma0);
    println!("beta                     {}", settings.beta);
    println!("tau                      {}", settings.tau);
    println!("draw_probability         {}", settings.draw_probability);
    println!("last_processed_match_id  {}", settings.last_processed_match_id);
    Ok(())
}
