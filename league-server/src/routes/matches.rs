//! Match log endpoint

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use league_core::{AgentId, LeagueId, MatchId, NewMatch};

use crate::error::ApiError;
use crate::state::{blocking, ServerState};

/// A finished game as reported by the executor
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub player1_id: AgentId,
    pub player2_id: AgentId,
    pub winner_id: Option<AgentId>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub match_id: MatchId,
}

pub async fn record_match(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
    Json(body): Json<MatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), ApiError> {
    let m = NewMatch {
        league_id,
        player1_id: body.player1_id,
        player2_id: body.player2_id,
        winner_id: body.winner_id,
        started_at: body.started_at,
        finished_at: body.finished_at,
        game_params: body.game_params,
    };
    let match_id = blocking(&state, move |s| s.store.record_match(&m)).await?;
    Ok((StatusCode::CREATED, Json(MatchResponse { match_id })))
}
