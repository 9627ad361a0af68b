//! Incremental rating processor and full rebuild
//!
//! Level 1 - Orchestration
//!
//! Both operations run inside one `BEGIN IMMEDIATE` transaction: the writer
//! lock is held from the cursor read until ratings and cursor are committed
//! together. The cursor write is a compare-and-set, so a writer that slipped
//! in anyway makes this one roll back instead of double-applying.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use league_core::{LeagueId, MatchId, Result};
use league_rank::{RatingLedger, ReplayOrder};

use crate::rows::{self, db_err};
use crate::store::SqliteStore;

/// Outcome of a rebuild
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Decisive matches replayed
    pub processed: usize,
    /// Agents with a rating touched by the replay
    pub agents_rated: usize,
    /// Cursor after the rebuild
    pub last_match_id: MatchId,
    pub order: ReplayOrder,
    pub reset: bool,
}

impl RebuildReport {
    /// Fewer than two agents took part in any decisive match
    pub fn is_degenerate(&self) -> bool {
        self.agents_rated < 2
    }
}

impl SqliteStore {
    /// Fold every match after the cursor into the ratings.
    ///
    /// Returns the number of decisive matches applied. Calling it again with
    /// no new matches applies nothing and changes nothing.
    pub fn update(&self, league_id: LeagueId) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;

        let settings = rows::load_settings(&tx, league_id)?;
        let cursor = settings.last_processed_match_id;
        let pending = rows::load_matches_after(&tx, league_id, cursor)?;
        if pending.is_empty() {
            debug!(league_id, cursor, "no new matches");
            return Ok(0);
        }

        let existing = rows::load_ratings(&tx, league_id)?;
        let mut ledger = RatingLedger::new(league_id, &settings, existing);
        for m in &pending {
            if !ledger.apply(m) {
                debug!(league_id, match_id = m.match_id, "skipping match without a decisive result");
            }
        }

        let Some(next_cursor) = ledger.last_applied() else {
            debug!(league_id, cursor, skipped = ledger.skipped(), "nothing decisive after cursor");
            return Ok(0);
        };

        rows::upsert_ratings(&tx, &ledger.touched_ratings(Utc::now()))?;
        rows::compare_and_set_cursor(&tx, league_id, cursor, next_cursor)?;
        tx.commit().map_err(db_err)?;

        info!(
            league_id,
            processed = ledger.applied(),
            cursor = next_cursor,
            model = ledger.model_name(),
            "ratings updated"
        );
        Ok(ledger.applied())
    }

    /// Replay every decisive match of the league in `order`.
    ///
    /// With `reset` the league's ratings are wiped first and every agent
    /// restarts from the prior; otherwise the replay continues from the
    /// stored ratings. The cursor ends at the largest replayed match id, so
    /// a later `update` never applies a replayed match twice.
    pub fn rebuild(&self, league_id: LeagueId, reset: bool, order: ReplayOrder) -> Result<RebuildReport> {
        let mut conn = self.lock()?;
        let tx = rows::immediate(&mut conn)?;

        let settings = rows::load_settings(&tx, league_id)?;
        let cursor = settings.last_processed_match_id;

        let existing = if reset {
            let wiped = rows::delete_ratings(&tx, league_id)?;
            debug!(league_id, wiped, "ratings reset");
            Vec::new()
        } else {
            rows::load_ratings(&tx, league_id)?
        };

        let mut matches = rows::load_matches(&tx, league_id)?;
        matches.retain(|m| m.is_decisive());
        order.sort(&mut matches);

        let mut ledger = RatingLedger::new(league_id, &settings, existing);
        ledger.apply_all(&matches);

        let touched = ledger.touched_ratings(Utc::now());
        rows::upsert_ratings(&tx, &touched)?;

        let next_cursor = match (reset, ledger.max_applied()) {
            (true, max) => max.unwrap_or(0),
            (false, max) => max.map_or(cursor, |m| m.max(cursor)),
        };
        rows::compare_and_set_cursor(&tx, league_id, cursor, next_cursor)?;
        tx.commit().map_err(db_err)?;

        let report = RebuildReport {
            processed: ledger.applied(),
            agents_rated: touched.len(),
            last_match_id: next_cursor,
            order,
            reset,
        };
        if report.is_degenerate() {
            warn!(league_id, agents = report.agents_rated, "rebuild found fewer than two agents");
        }
        info!(
            league_id,
            processed = report.processed,
            agents = report.agents_rated,
            cursor = next_cursor,
            %order,
            reset,
            "ratings rebuilt"
        );
        Ok(report)
    }
}
