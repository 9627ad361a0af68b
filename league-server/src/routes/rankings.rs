//! Read-only league views

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use league_core::{AgentId, LeagueId, Rating};
use league_rank::{AgentMatchups, AlphaRankOutcome};

use crate::error::ApiError;
use crate::state::{blocking, ServerState};

pub async fn get_ratings(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
) -> Result<Json<Vec<Rating>>, ApiError> {
    let ratings = blocking(&state, move |s| s.store.ratings(league_id)).await?;
    Ok(Json(ratings))
}

#[derive(Debug, Default, Deserialize)]
pub struct AlphaRankQuery {
    pub alpha: Option<f64>,
    pub mutation: Option<f64>,
}

pub async fn get_alpharank(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
    Query(query): Query<AlphaRankQuery>,
) -> Result<Json<AlphaRankOutcome>, ApiError> {
    let mut config = state.alpharank.clone();
    if let Some(alpha) = query.alpha {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(ApiError::BadRequest("alpha must be a non-negative number".to_string()));
        }
        config.alpha = alpha;
    }
    if let Some(mutation) = query.mutation {
        if !(mutation.is_finite() && mutation >= 0.0) {
            return Err(ApiError::BadRequest("mutation must be a non-negative number".to_string()));
        }
        config.mutation = mutation;
    }
    let outcome = blocking(&state, move |s| s.store.rank(league_id, &config)).await?;
    Ok(Json(outcome))
}

pub async fn get_matchups(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
) -> Result<Json<Vec<AgentMatchups>>, ApiError> {
    let table = blocking(&state, move |s| s.store.matchups(league_id)).await?;
    Ok(Json(table))
}

#[derive(Debug, Serialize)]
pub struct NextPairResponse {
    pub league_id: LeagueId,
    /// `[focal, opponent]`, or null with fewer than two agents
    pub pair: Option<[AgentId; 2]>,
    pub selector: &'static str,
}

pub async fn get_next_pair(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
) -> Result<Json<NextPairResponse>, ApiError> {
    let selector = state.selector.name();
    let pair = blocking(&state, move |s| {
        let mut rng = rand::thread_rng();
        s.store.next_pair(league_id, s.selector.as_ref(), Utc::now(), &mut rng)
    })
    .await?;
    Ok(Json(NextPairResponse {
        league_id,
        pair: pair.map(|(a, b)| [a, b]),
        selector,
    }))
}
