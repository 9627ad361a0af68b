//! Row mapping and the SQL steps shared by the store operations
//!
//! Level 3 - Steps. Everything here takes a plain `&Connection` so it runs
//! equally inside or outside a transaction.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use rustc_hash::FxHashMap;

use league_core::{
    Agent, AgentId, LeagueError, LeagueId, LeagueSettings, Match, MatchId, NewMatch, Rating, Result,
};

/// Storage failure into the shared error type
pub(crate) fn db_err(e: rusqlite::Error) -> LeagueError {
    LeagueError::Storage(e.to_string())
}

/// Write transaction that takes the database writer lock up front
pub(crate) fn immediate(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(db_err)
}

pub(crate) fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

fn from_millis(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, "timestamp out of range".into()))
}

fn opt_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(idx)?
        .map(|ms| from_millis(idx, ms))
        .transpose()
}

// ============================================================================
// Row mapping
// ============================================================================

pub(crate) const AGENT_COLUMNS: &str = "agent_id, name, created_at";

pub(crate) fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        agent_id: row.get(0)?,
        name: row.get(1)?,
        created_at: from_millis(2, row.get(2)?)?,
    })
}

pub(crate) const MATCH_COLUMNS: &str =
    "match_id, league_id, player1_id, player2_id, winner_id, started_at, finished_at, game_params";

pub(crate) fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    let params: String = row.get(7)?;
    let game_params = serde_json::from_str(&params)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Match {
        match_id: row.get(0)?,
        league_id: row.get(1)?,
        player1_id: row.get(2)?,
        player2_id: row.get(3)?,
        winner_id: row.get(4)?,
        started_at: opt_time(row, 5)?,
        finished_at: opt_time(row, 6)?,
        game_params,
    })
}

pub(crate) fn rating_from_row(row: &Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        agent_id: row.get(0)?,
        league_id: row.get(1)?,
        mu: row.get(2)?,
        sigma: row.get(3)?,
        updated_at: opt_time(row, 4)?,
    })
}

// ============================================================================
// Settings
// ============================================================================

/// Settings of a league, or `None` if it was never created
pub(crate) fn find_settings(conn: &Connection, league_id: LeagueId) -> Result<Option<LeagueSettings>> {
    let doc: Option<String> = conn
        .query_row("SELECT settings FROM leagues WHERE league_id = ?1", [league_id], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match doc {
        Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
        None => Ok(None),
    }
}

pub(crate) fn load_settings(conn: &Connection, league_id: LeagueId) -> Result<LeagueSettings> {
    find_settings(conn, league_id)?.ok_or(LeagueError::UnknownLeague(league_id))
}

/// Insert or replace the whole settings document
pub(crate) fn write_settings(conn: &Connection, league_id: LeagueId, settings: &LeagueSettings) -> Result<()> {
    let doc = serde_json::to_string(settings)?;
    conn.execute(
        "INSERT INTO leagues (league_id, settings, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(league_id) DO UPDATE SET settings = excluded.settings",
        params![league_id, doc, to_millis(Utc::now())],
    )
    .map_err(db_err)?;
    Ok(())
}

/// Move the cursor from `expected` to `next`.
///
/// Fails with `ConcurrentUpdate` if another writer moved it first.
pub(crate) fn compare_and_set_cursor(
    conn: &Connection,
    league_id: LeagueId,
    expected: MatchId,
    next: MatchId,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE leagues
             SET settings = json_set(settings, '$.last_processed_match_id', ?3)
             WHERE league_id = ?1
               AND COALESCE(json_extract(settings, '$.last_processed_match_id'), 0) = ?2",
            params![league_id, expected, next],
        )
        .map_err(db_err)?;
    if updated == 0 {
        return Err(LeagueError::ConcurrentUpdate(league_id));
    }
    Ok(())
}

// ============================================================================
// Agents
// ============================================================================

pub(crate) fn find_agent(conn: &Connection, agent_id: AgentId) -> Result<Option<Agent>> {
    conn.query_row(
        &format!("SELECT {} FROM agents WHERE agent_id = ?1", AGENT_COLUMNS),
        [agent_id],
        agent_from_row,
    )
    .optional()
    .map_err(db_err)
}

pub(crate) fn require_agent(conn: &Connection, agent_id: AgentId) -> Result<Agent> {
    find_agent(conn, agent_id)?.ok_or(LeagueError::UnknownAgent(agent_id))
}

pub(crate) fn agent_names(conn: &Connection) -> Result<FxHashMap<AgentId, String>> {
    let mut stmt = conn.prepare("SELECT agent_id, name FROM agents").map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, AgentId>(0)?, row.get::<_, String>(1)?)))
        .map_err(db_err)?;
    rows.collect::<rusqlite::Result<_>>().map_err(db_err)
}

pub(crate) fn add_entrant(conn: &Connection, league_id: LeagueId, agent_id: AgentId) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO league_agents (league_id, agent_id, joined_at) VALUES (?1, ?2, ?3)",
            params![league_id, agent_id, to_millis(Utc::now())],
        )
        .map_err(db_err)?;
    Ok(inserted > 0)
}

pub(crate) fn load_entrants(conn: &Connection, league_id: LeagueId) -> Result<Vec<AgentId>> {
    let mut stmt = conn
        .prepare("SELECT agent_id FROM league_agents WHERE league_id = ?1 ORDER BY agent_id")
        .map_err(db_err)?;
    let rows = stmt.query_map([league_id], |row| row.get::<_, AgentId>(0)).map_err(db_err)?;
    rows.collect::<rusqlite::Result<_>>().map_err(db_err)
}

// ============================================================================
// Matches and ratings
// ============================================================================

/// Every match of a league, ascending id
pub(crate) fn load_matches(conn: &Connection, league_id: LeagueId) -> Result<Vec<Match>> {
    load_matches_after(conn, league_id, MatchId::MIN)
}

/// Matches with id strictly greater than `cursor`, ascending id
pub(crate) fn load_matches_after(conn: &Connection, league_id: LeagueId, cursor: MatchId) -> Result<Vec<Match>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {} FROM matches WHERE league_id = ?1 AND match_id > ?2 ORDER BY match_id",
            MATCH_COLUMNS
        ))
        .map_err(db_err)?;
    let rows = stmt.query_map(params![league_id, cursor], match_from_row).map_err(db_err)?;
    rows.collect::<rusqlite::Result<_>>().map_err(db_err)
}

pub(crate) fn insert_match(conn: &Connection, m: &NewMatch) -> Result<MatchId> {
    let params_doc = serde_json::to_string(&m.game_params)?;
    conn.execute(
        "INSERT INTO matches (league_id, player1_id, player2_id, winner_id, started_at, finished_at, game_params)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            m.league_id,
            m.player1_id,
            m.player2_id,
            m.winner_id,
            m.started_at.map(to_millis),
            m.finished_at.map(to_millis),
            params_doc,
        ],
    )
    .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

/// Ratings of a league, ascending agent id
pub(crate) fn load_ratings(conn: &Connection, league_id: LeagueId) -> Result<Vec<Rating>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT agent_id, league_id, mu, sigma, updated_at FROM ratings
             WHERE league_id = ?1 ORDER BY agent_id",
        )
        .map_err(db_err)?;
    let rows = stmt.query_map([league_id], rating_from_row).map_err(db_err)?;
    rows.collect::<rusqlite::Result<_>>().map_err(db_err)
}

pub(crate) fn upsert_ratings(conn: &Connection, ratings: &[Rating]) -> Result<()> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO ratings (agent_id, league_id, mu, sigma, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(agent_id, league_id) DO UPDATE SET
                 mu = excluded.mu, sigma = excluded.sigma, updated_at = excluded.updated_at",
        )
        .map_err(db_err)?;
    for r in ratings {
        stmt.execute(params![
            r.agent_id,
            r.league_id,
            r.mu,
            r.sigma,
            r.updated_at.map(to_millis),
        ])
        .map_err(db_err)?;
    }
    Ok(())
}

pub(crate) fn delete_ratings(conn: &Connection, league_id: LeagueId) -> Result<usize> {
    conn.execute("DELETE FROM ratings WHERE league_id = ?1", [league_id])
        .map_err(db_err)
}
