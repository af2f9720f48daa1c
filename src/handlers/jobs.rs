use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::Result, jobs, jobs::QueueDepth, state::AppState};

pub async fn refresh_all_users(State(state): State<AppState>) -> Result<Json<Value>> {
    let scheduled = jobs::schedule_all_users_refresh(&state).await?;

    Ok(Json(json!({ "scheduled_users": scheduled })))
}

pub async fn queue_stats(State(state): State<AppState>) -> Result<Json<QueueDepth>> {
    Ok(Json(state.job_queue.queue_depth()))
}
