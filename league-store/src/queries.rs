//! Read-only league views: ranking, matchups and the next pair
//!
//! Each view loads its inputs in one read transaction, releases the
//! connection, then computes on the snapshot.

use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::debug;

use league_core::{AgentId, LeagueId, Result};
use league_rank::{
    alpharank, matchups, AgentMatchups, AlphaRankConfig, AlphaRankOutcome, LeagueSnapshot, PairSelector,
    WinRateMatrix,
};

use crate::rows::{self, db_err};
use crate::store::SqliteStore;

impl SqliteStore {
    /// AlphaRank over every decisive match of the league
    pub fn rank(&self, league_id: LeagueId, config: &AlphaRankConfig) -> Result<AlphaRankOutcome> {
        let (matches, names) = {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(db_err)?;
            rows::load_settings(&tx, league_id)?;
            let matches = rows::load_matches(&tx, league_id)?;
            let names = rows::agent_names(&tx)?;
            tx.commit().map_err(db_err)?;
            (matches, names)
        };

        let matrix = WinRateMatrix::from_matches(&matches);
        let outcome = alpharank(&matrix, &names, config);
        match &outcome {
            AlphaRankOutcome::Ranked(r) => debug!(
                league_id,
                agents = r.agents.len(),
                iterations = r.iterations,
                converged = r.converged,
                "alpharank computed"
            ),
            AlphaRankOutcome::NotEnoughAgents { agents } => {
                debug!(league_id, agents, "not enough agents to rank")
            }
        }
        Ok(outcome)
    }

    /// Head-to-head tables for every agent with a decisive match
    pub fn matchups(&self, league_id: LeagueId) -> Result<Vec<AgentMatchups>> {
        let (matches, names) = {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(db_err)?;
            rows::load_settings(&tx, league_id)?;
            let matches = rows::load_matches(&tx, league_id)?;
            let names = rows::agent_names(&tx)?;
            tx.commit().map_err(db_err)?;
            (matches, names)
        };
        Ok(matchups(&matches, &names))
    }

    /// Ratings, history and entrants as one consistent scheduling view
    pub fn snapshot(&self, league_id: LeagueId) -> Result<LeagueSnapshot> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let settings = rows::load_settings(&tx, league_id)?;
        let ratings = rows::load_ratings(&tx, league_id)?;
        let matches = rows::load_matches(&tx, league_id)?;
        let entrants = rows::load_entrants(&tx, league_id)?;
        tx.commit().map_err(db_err)?;
        Ok(LeagueSnapshot::build(&ratings, &matches, &entrants, &settings))
    }

    /// Pick the next pair to play, or `None` with fewer than two agents
    pub fn next_pair(
        &self,
        league_id: LeagueId,
        selector: &dyn PairSelector,
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<(AgentId, AgentId)>> {
        let snapshot = self.snapshot(league_id)?;
        let pair = selector.select(&snapshot, now, rng);
        debug!(league_id, selector = selector.name(), agents = snapshot.len(), ?pair, "next pair");
        Ok(pair)
    }
}
