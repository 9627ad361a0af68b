//! Status endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use league_core::LeagueId;

use crate::error::ApiError;
use crate::state::{blocking, ServerState};

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Leagues with stored settings
    pub leagues: Vec<LeagueId>,
    pub agents: usize,
    /// Pair selector behind `/next-pair`
    pub selector: &'static str,
}

pub async fn status_handler(State(state): State<Arc<ServerState>>) -> Result<Json<StatusResponse>, ApiError> {
    let selector = state.selector.name();
    let (leagues, agents) = blocking(&state, |s| Ok((s.store.leagues()?, s.store.agents()?.len()))).await?;
    Ok(Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        leagues,
        agents,
        selector,
    }))
}
