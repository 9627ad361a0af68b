//! League settings and rating processor endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use league_core::{LeagueId, LeagueSettings, SettingsOverrides};
use league_rank::ReplayOrder;
use league_store::RebuildReport;

use crate::error::ApiError;
use crate::state::{blocking, ServerState};

pub async fn get_settings(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
) -> Result<Json<LeagueSettings>, ApiError> {
    let settings = blocking(&state, move |s| s.store.settings(league_id)).await?;
    Ok(Json(settings))
}

/// Create the league if needed and apply the given overrides
pub async fn put_settings(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
    Json(overrides): Json<SettingsOverrides>,
) -> Result<Json<LeagueSettings>, ApiError> {
    let settings = blocking(&state, move |s| s.store.ensure_league(league_id, &overrides)).await?;
    Ok(Json(settings))
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub league_id: LeagueId,
    pub processed: usize,
}

pub async fn update_ratings(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let processed = blocking(&state, move |s| s.store.update(league_id)).await?;
    Ok(Json(UpdateResponse { league_id, processed }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RebuildRequest {
    pub reset: bool,
    pub order: ReplayOrder,
}

pub async fn rebuild_ratings(
    State(state): State<Arc<ServerState>>,
    Path(league_id): Path<LeagueId>,
    body: Option<Json<RebuildRequest>>,
) -> Result<Json<RebuildReport>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let report = blocking(&state, move |s| s.store.rebuild(league_id, request.reset, request.order)).await?;
    Ok(Json(report))
}
