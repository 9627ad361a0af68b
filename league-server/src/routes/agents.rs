//! Agent registry endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use league_core::{Agent, AgentId, LeagueId};

use crate::error::ApiError;
use crate::state::{blocking, ServerState};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

/// Register an agent; an existing name returns the existing agent
pub async fn register_agent(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Agent>, ApiError> {
    let agent = blocking(&state, move |s| s.store.register_agent(&body.name)).await?;
    Ok(Json(agent))
}

#[derive(Debug, Deserialize)]
pub struct EntrantRequest {
    pub agent_id: AgentId,
}

#[derive(Debug, Serialize)]
pub struct EntrantResponse {
    pub league_id: LeagueId,
    pub agent_id: AgentId,
    /// False if the agent was already an entrant
    pub added: bool,
}

pub async fn enter_league(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
    Json(body): Json<EntrantRequest>,
) -> Result<Json<EntrantResponse>, ApiError> {
    let agent_id = body.agent_id;
    let added = blocking(&state, move |s| s.store.enter_league(league_id, agent_id)).await?;
    Ok(Json(EntrantResponse {
        league_id,
        agent_id,
        added,
    }))
}
