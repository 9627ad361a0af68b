//! SQLite-backed league store: settings, agent registry and match log
//!
//! Level 2 - Phases

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use league_core::{
    Agent, AgentId, LeagueError, LeagueId, LeagueSettings, Match, MatchId, NewMatch, Rating, Result,
    SettingsOverrides,
};

use crate::rows::{self, db_err, to_millis, AGENT_COLUMNS};
use crate::schema;

/// League state in one SQLite database.
///
/// `rusqlite::Connection` is not `Sync`, so it sits behind a mutex. Several
/// stores (or processes) may open the same file; SQLite's locking and the
/// cursor compare-and-set keep their writes from interleaving.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Result of recording a best-of series
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SeriesRecord {
    /// One row per won game, in insertion order
    pub match_ids: Vec<MatchId>,
    /// Played but not stored
    pub draws: u32,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LeagueError::Storage(format!("cannot create {}: {}", parent.display(), e)))?;
            }
        }
        let conn = Connection::open(path).map_err(db_err)?;
        schema::initialize(&conn).map_err(db_err)?;
        debug!(path = %path.display(), "opened league database");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        schema::initialize(&conn).map_err(db_err)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LeagueError::Storage(format!("Lock poisoned: {}", e)))
    }

    // ========================================================================
    // League settings
    // ========================================================================

    /// Get or create a league, then apply `overrides`.
    ///
    /// Missing hyperparameters in a stored document are filled with defaults
    /// and written back. The cursor is never touched.
    pub fn ensure_league(&self, league_id: LeagueId, overrides: &SettingsOverrides) -> Result<LeagueSettings> {
        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;

        let stored: Option<String> = tx
            .query_row("SELECT settings FROM leagues WHERE league_id = ?1", [league_id], |row| row.get(0))
            .optional()
            .map_err(db_err)?;

        let (mut settings, mut changed) = match stored {
            None => (LeagueSettings::default(), true),
            Some(doc) => {
                let settings: LeagueSettings = serde_json::from_str(&doc)?;
                // Re-serialising adds any keys the stored document lacked
                let complete = serde_json::to_value(&settings)?;
                let raw: serde_json::Value = serde_json::from_str(&doc)?;
                (settings, complete != raw)
            }
        };
        changed |= settings.apply(overrides);
        settings.validate()?;

        if changed {
            rows::write_settings(&tx, league_id, &settings)?;
            info!(league_id, "league settings saved");
        }
        tx.commit().map_err(db_err)?;
        Ok(settings)
    }

    pub fn settings(&self, league_id: LeagueId) -> Result<LeagueSettings> {
        let conn = self.lock()?;
        rows::load_settings(&conn, league_id)
    }

    /// Change hyperparameters of an existing league
    pub fn update_settings(&self, league_id: LeagueId, overrides: &SettingsOverrides) -> Result<LeagueSettings> {
        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;
        let mut settings = rows::load_settings(&tx, league_id)?;
        if settings.apply(overrides) {
            settings.validate()?;
            rows::write_settings(&tx, league_id, &settings)?;
            info!(league_id, ?overrides, "league settings updated");
        }
        tx.commit().map_err(db_err)?;
        Ok(settings)
    }

    pub fn leagues(&self) -> Result<Vec<LeagueId>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT league_id FROM leagues ORDER BY league_id")
            .map_err(db_err)?;
        let ids = stmt.query_map([], |row| row.get::<_, LeagueId>(0)).map_err(db_err)?;
        ids.collect::<rusqlite::Result<_>>().map_err(db_err)
    }

    // ========================================================================
    // Agent registry
    // ========================================================================

    /// Register an agent by name; returns the existing agent if the name is taken
    pub fn register_agent(&self, name: &str) -> Result<Agent> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::InvalidAgent("name cannot be empty".to_string()));
        }
        let conn = self.lock()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO agents (name, created_at) VALUES (?1, ?2)",
                params![name, to_millis(Utc::now())],
            )
            .map_err(db_err)?;
        let agent = conn
            .query_row(
                &format!("SELECT {} FROM agents WHERE name = ?1", AGENT_COLUMNS),
                [name],
                rows::agent_from_row,
            )
            .map_err(db_err)?;
        if inserted > 0 {
            info!(agent_id = agent.agent_id, name = %agent.name, "registered agent");
        }
        Ok(agent)
    }

    pub fn agent(&self, agent_id: AgentId) -> Result<Agent> {
        let conn = self.lock()?;
        rows::require_agent(&conn, agent_id)
    }

    pub fn agent_by_name(&self, name: &str) -> Result<Option<Agent>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM agents WHERE name = ?1", AGENT_COLUMNS),
            [name],
            rows::agent_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    pub fn agents(&self) -> Result<Vec<Agent>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM agents ORDER BY agent_id", AGENT_COLUMNS))
            .map_err(db_err)?;
        let agents = stmt.query_map([], rows::agent_from_row).map_err(db_err)?;
        agents.collect::<rusqlite::Result<_>>().map_err(db_err)
    }

    /// Make an agent eligible for scheduling in a league. Returns false if it already was.
    pub fn enter_league(&self, league_id: LeagueId, agent_id: AgentId) -> Result<bool> {
        let conn = self.lock()?;
        rows::load_settings(&conn, league_id)?;
        rows::require_agent(&conn, agent_id)?;
        let added = rows::add_entrant(&conn, league_id, agent_id)?;
        if added {
            info!(league_id, agent_id, "agent entered league");
        }
        Ok(added)
    }

    pub fn entrants(&self, league_id: LeagueId) -> Result<Vec<AgentId>> {
        let conn = self.lock()?;
        rows::load_entrants(&conn, league_id)
    }

    // ========================================================================
    // Match log
    // ========================================================================

    /// Append one match. Both players become entrants of the league.
    pub fn record_match(&self, m: &NewMatch) -> Result<MatchId> {
        m.validate()?;
        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;
        let match_id = insert_checked(&tx, m)?;
        tx.commit().map_err(db_err)?;
        debug!(match_id, league_id = m.league_id, winner = ?m.winner_id, "recorded match");
        Ok(match_id)
    }

    /// Record a series between `a` and `b`: one decisive row per won game.
    ///
    /// Draws cannot be rated, so they are only counted.
    #[allow(clippy::too_many_arguments)]
    pub fn record_series(
        &self,
        league_id: LeagueId,
        a: AgentId,
        b: AgentId,
        wins_a: u32,
        wins_b: u32,
        draws: u32,
        game_params: serde_json::Value,
    ) -> Result<SeriesRecord> {
        let now = Utc::now();
        let won = |winner| {
            NewMatch::decisive(league_id, a, b, winner)
                .with_times(now, now)
                .with_params(game_params.clone())
        };
        let games: Vec<NewMatch> = std::iter::repeat_with(|| won(a))
            .take(wins_a as usize)
            .chain(std::iter::repeat_with(|| won(b)).take(wins_b as usize))
            .collect();
        if let Some(first) = games.first() {
            first.validate()?;
        } else if a == b {
            return Err(LeagueError::InvalidMatch(format!("agent {} cannot play itself", a)));
        }

        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;
        let mut match_ids = Vec::with_capacity(games.len());
        for game in &games {
            match_ids.push(insert_checked(&tx, game)?);
        }
        tx.commit().map_err(db_err)?;

        info!(league_id, a, b, wins_a, wins_b, draws, "recorded series");
        Ok(SeriesRecord { match_ids, draws })
    }

    pub fn matches(&self, league_id: LeagueId) -> Result<Vec<Match>> {
        let conn = self.lock()?;
        rows::load_matches(&conn, league_id)
    }

    /// Current ratings, best `mu` first
    pub fn ratings(&self, league_id: LeagueId) -> Result<Vec<Rating>> {
        let conn = self.lock()?;
        rows::load_settings(&conn, league_id)?;
        let mut ratings = rows::load_ratings(&conn, league_id)?;
        ratings.sort_by(|a, b| b.mu.total_cmp(&a.mu).then_with(|| a.agent_id.cmp(&b.agent_id)));
        Ok(ratings)
    }
}

/// Insert after checking that the league and both players exist
fn insert_checked(conn: &Connection, m: &NewMatch) -> Result<MatchId> {
    rows::load_settings(conn, m.league_id)?;
    rows::require_agent(conn, m.player1_id)?;
    rows::require_agent(conn, m.player2_id)?;
    let match_id = rows::insert_match(conn, m)?;
    rows::add_entrant(conn, m.league_id, m.player1_id)?;
    rows::add_entrant(conn, m.league_id, m.player2_id)?;
    Ok(match_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_league() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_league(1, &SettingsOverrides::default()).unwrap();
        store
    }

    #[test]
    fn test_ensure_league_creates_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let settings = store.ensure_league(7, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings, LeagueSettings::default());
        assert_eq!(store.settings(7).unwrap(), settings);
        assert_eq!(store.leagues().unwrap(), vec![7]);
    }

    #[test]
    fn test_ensure_league_applies_overrides_but_keeps_cursor() {
        let store = store_with_league();
        {
            let conn = store.lock().unwrap();
            rows::compare_and_set_cursor(&conn, 1, 0, 42).unwrap();
        }
        let overrides = SettingsOverrides {
            tau: Some(0.5),
            ..Default::default()
        };
        let settings = store.ensure_league(1, &overrides).unwrap();
        assert_eq!(settings.tau, 0.5);
        assert_eq!(settings.last_processed_match_id, 42);
    }

    #[test]
    fn test_ensure_league_fills_missing_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO leagues (league_id, settings, created_at) VALUES (3, '{\"beta\": 2.0}', 0)",
                [],
            )
            .unwrap();
        }
        let settings = store.ensure_league(3, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.beta, 2.0);
        assert_eq!(settings.mu0, 25.0);

        let conn = store.lock().unwrap();
        let doc: String = conn
            .query_row("SELECT settings FROM leagues WHERE league_id = 3", [], |row| row.get(0))
            .unwrap();
        assert!(doc.contains("sigma0"));
        assert!(doc.contains("last_processed_match_id"));
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let store = store_with_league();
        let overrides = SettingsOverrides {
            sigma0: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(store.update_settings(1, &overrides), Err(LeagueError::InvalidSettings(_))));
        assert_eq!(store.settings(1).unwrap().sigma0, LeagueSettings::default().sigma0);
    }

    #[test]
    fn test_unknown_league() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.settings(9), Err(LeagueError::UnknownLeague(9))));
        assert!(matches!(store.ratings(9), Err(LeagueError::UnknownLeague(9))));
    }

    #[test]
    fn test_register_agent_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.register_agent("random-bot").unwrap();
        let b = store.register_agent("random-bot").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.agents().unwrap().len(), 1);
        assert_eq!(store.agent_by_name("random-bot").unwrap(), Some(a));
        assert!(store.register_agent("  ").is_err());
    }

    #[test]
    fn test_record_match_validates() {
        let store = store_with_league();
        let a = store.register_agent("a").unwrap().agent_id;
        let b = store.register_agent("b").unwrap().agent_id;

        assert!(matches!(
            store.record_match(&NewMatch::decisive(1, a, a, a)),
            Err(LeagueError::InvalidMatch(_))
        ));
        assert!(matches!(
            store.record_match(&NewMatch::decisive(1, a, 999, a)),
            Err(LeagueError::UnknownAgent(999))
        ));
        assert!(matches!(
            store.record_match(&NewMatch::decisive(2, a, b, a)),
            Err(LeagueError::UnknownLeague(2))
        ));

        let id = store.record_match(&NewMatch::decisive(1, a, b, b)).unwrap();
        let stored = store.matches(1).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].match_id, id);
        assert_eq!(stored[0].winner_id, Some(b));
        assert_eq!(store.entrants(1).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_record_match_round_trips_times_and_params() {
        let store = store_with_league();
        let a = store.register_agent("a").unwrap().agent_id;
        let b = store.register_agent("b").unwrap().agent_id;
        let start = chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let finish = chrono::DateTime::from_timestamp_millis(1_700_000_060_456).unwrap();
        let m = NewMatch::decisive(1, a, b, a)
            .with_times(start, finish)
            .with_params(serde_json::json!({"map": "arena", "seed": 3}));
        store.record_match(&m).unwrap();

        let stored = &store.matches(1).unwrap()[0];
        assert_eq!(stored.started_at, Some(start));
        assert_eq!(stored.finished_at, Some(finish));
        assert_eq!(stored.game_params["map"], "arena");
    }

    #[test]
    fn test_record_series_skips_draws() {
        let store = store_with_league();
        let a = store.register_agent("a").unwrap().agent_id;
        let b = store.register_agent("b").unwrap().agent_id;

        let series = store
            .record_series(1, a, b, 3, 1, 2, serde_json::json!({"mode": "remote_pair"}))
            .unwrap();
        assert_eq!(series.match_ids.len(), 4);
        assert_eq!(series.draws, 2);

        let stored = store.matches(1).unwrap();
        assert_eq!(stored.iter().filter(|m| m.winner_id == Some(a)).count(), 3);
        assert_eq!(stored.iter().filter(|m| m.winner_id == Some(b)).count(), 1);
        assert!(store.record_series(1, a, a, 0, 0, 1, serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_enter_league() {
        let store = store_with_league();
        let a = store.register_agent("a").unwrap().agent_id;
        assert!(store.enter_league(1, a).unwrap());
        assert!(!store.enter_league(1, a).unwrap());
        assert!(matches!(store.enter_league(1, 55), Err(LeagueError::UnknownAgent(55))));
        assert!(matches!(store.enter_league(4, a), Err(LeagueError::UnknownLeague(4))));
    }
}
