//! Database schema
//!
//! Timestamps are stored as INTEGER milliseconds since the Unix epoch.
//! League settings (including the processing cursor) are one JSON document
//! per league.

use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS agents (
    agent_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS leagues (
    league_id INTEGER PRIMARY KEY,
    settings TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS league_agents (
    league_id INTEGER NOT NULL,
    agent_id INTEGER NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (league_id, agent_id)
);

CREATE TABLE IF NOT EXISTS ratings (
    agent_id INTEGER NOT NULL,
    league_id INTEGER NOT NULL,
    mu REAL NOT NULL,
    sigma REAL NOT NULL,
    updated_at INTEGER,
    PRIMARY KEY (agent_id, league_id)
);

CREATE TABLE IF NOT EXISTS matches (
    match_id INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id INTEGER NOT NULL,
    player1_id INTEGER NOT NULL,
    player2_id INTEGER NOT NULL,
    winner_id INTEGER,
    started_at INTEGER,
    finished_at INTEGER,
    game_params TEXT NOT NULL DEFAULT 'null'
);

CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id, match_id);
CREATE INDEX IF NOT EXISTS idx_ratings_league ON ratings(league_id);
";

/// Connection pragmas and tables. Safe to run on every open.
pub(crate) fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    // journal_mode returns a row, so it cannot go through execute_batch
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)
}
