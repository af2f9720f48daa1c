use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    db::entities::{listening_history, top_artists, top_tracks},
    db::enums::TimeRange,
    error::Result,
    services::{PlaylistExport, SyncService},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RangeQuery {
    pub time_range: Option<TimeRange>,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct ExportPlaylistRequest {
    pub time_range: Option<TimeRange>,
    pub name: Option<String>,
}

pub async fn refresh_all(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let sync = SyncService::new(state.db.clone(), state.spotify.clone());
    sync.refresh_all(user_id).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn top_artists(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<top_artists::Model>>> {
    let sync = SyncService::new(state.db.clone(), state.spotify.clone());
    let time_range = query.time_range.unwrap_or(TimeRange::MediumTerm);

    Ok(Json(sync.get_top_artists(user_id, time_range).await?))
}

pub async fn top_tracks(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<top_tracks::Model>>> {
    let sync = SyncService::new(state.db.clone(), state.spotify.clone());
    let time_range = query.time_range.unwrap_or(TimeRange::MediumTerm);

    Ok(Json(sync.get_top_tracks(user_id, time_range).await?))
}

pub async fn recently_played(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<listening_history::Model>>> {
    let sync = SyncService::new(state.db.clone(), state.spotify.clone());
    let limit = query.limit.unwrap_or(50).min(200);

    Ok(Json(sync.get_recently_played(user_id, limit).await?))
}

pub async fn export_playlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ExportPlaylistRequest>,
) -> Result<Json<PlaylistExport>> {
    let sync = SyncService::new(state.db.clone(), state.spotify.clone());
    let time_range = request.time_range.unwrap_or(TimeRange::MediumTerm);

    Ok(Json(
        sync.export_top_tracks_as_playlist(user_id, time_range, request.name)
            .await?,
    ))
}
