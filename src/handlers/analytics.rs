use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::enums::TimeRange,
    error::Result,
    services::{AnalyticsService, DashboardStats, Discovery, GenreShare},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RangeQuery {
    pub time_range: Option<TimeRange>,
}

pub async fn genre_distribution(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<GenreShare>>> {
    let analytics = AnalyticsService::new(state.db.clone());
    let time_range = query.time_range.unwrap_or(TimeRange::MediumTerm);

    Ok(Json(
        analytics.genre_distribution(user_id, time_range).await?,
    ))
}

pub async fn monthly_discoveries(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Discovery>>> {
    let analytics = AnalyticsService::new(state.db.clone());

    Ok(Json(analytics.monthly_discoveries(user_id).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DashboardStats>> {
    let analytics = AnalyticsService::new(state.db.clone());

    Ok(Json(analytics.dashboard_stats(user_id).await?))
}
