//! Configuration file and command context
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: load() - locate, parse, override
//! - Level 2: locate(), parse(), apply_env_overrides()
//! - Level 4: FileConfig, Context

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use league_core::{LeagueId, SettingsOverrides};
use league_rank::{AlphaRankConfig, SchedulerConfig};
use league_server::ServerConfig;
use league_store::SqliteStore;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "LEAGUE_CONFIG";
/// Environment variable overriding `database`
pub const DB_ENV: &str = "LEAGUE_DB";
/// Environment variable overriding `league_id`
pub const LEAGUE_ENV: &str = "LEAGUE_ID";

pub const DEFAULT_CONFIG_PATH: &str = "league.toml";

// ============================================================================
// CONFIGURATION (Level 4)
// ============================================================================

/// Contents of `league.toml`; every key is optional
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: PathBuf,
    pub league_id: LeagueId,
    pub alpharank: AlphaRankConfig,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("league.db"),
            league_id: 1,
            alpharank: AlphaRankConfig::default(),
            scheduler: SchedulerConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl FileConfig {
    /// Explicit command-line flags win over the file and the environment
    pub fn with_flags(mut self, db: Option<PathBuf>, league: Option<LeagueId>) -> Self {
        if let Some(db) = db {
            self.database = db;
        }
        if let Some(league) = league {
            self.league_id = league;
        }
        self
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Load the configuration.
///
/// The file is searched in this order:
/// 1. `--config FILE` (must exist)
/// 2. `$LEAGUE_CONFIG`
/// 3. `./league.toml`
///
/// Without a file the built-in defaults are used. `LEAGUE_DB` and
/// `LEAGUE_ID` are applied on top.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let config = match locate(explicit, std::env::var(CONFIG_ENV).ok())? {
        Some(path) => {
            info!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse(&content).with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => {
            debug!("No league.toml found, using built-in defaults");
            FileConfig::default()
        }
    };
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn locate(explicit: Option<&Path>, from_env: Option<String>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(path) = from_env {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
        warn!("{}={} not found, searching defaults", CONFIG_ENV, path.display());
    }

    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}

pub fn parse(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;
    config.scheduler.weights.validate()?;
    Ok(config)
}

fn apply_env_overrides(mut config: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<FileConfig> {
    if let Some(db) = lookup(DB_ENV) {
        config.database = PathBuf::from(db);
    }
    if let Some(league) = lookup(LEAGUE_ENV) {
        config.league_id = league
            .trim()
            .parse()
            .with_context(|| format!("{} must be an integer, got '{}'", LEAGUE_ENV, league))?;
    }
    Ok(config)
}

// ============================================================================
// COMMAND CONTEXT
// ============================================================================

/// Resolved configuration shared by every subcommand
pub struct Context {
    pub config: FileConfig,
}

impl Context {
    pub fn new(config: FileConfig) -> Self {
        Self { config }
    }

    pub fn league_id(&self) -> LeagueId {
        self.config.league_id
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.config.database)
            .with_context(|| format!("Failed to open database {}", self.config.database.display()))
    }

    /// Open the store and create the league with default settings if needed
    pub fn open_league(&self) -> Result<SqliteStore> {
        let store = self.open_store()?;
        store
            .ensure_league(self.league_id(), &SettingsOverrides::default())
            .with_context(|| format!("Failed to prepare league {}", self.league_id()))?;
        Ok(store)
    }
}

// ============================================================================
// TESTS
// ============================================================================
