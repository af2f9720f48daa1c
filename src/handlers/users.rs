use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    db::entities::users,
    error::Result,
    services::{UserService, UserStats},
    state::AppState,
};

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<users::Model>> {
    let users = UserService::new(state.db.clone());

    // Token fields are skipped during serialization
    Ok(Json(users.find_by_id(user_id).await?))
}

pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStats>> {
    let users = UserService::new(state.db.clone());

    Ok(Json(users.user_stats(user_id).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let users = UserService::new(state.db.clone());
    users.delete_user(user_id).await?;

    Ok(Json(json!({ "deleted": true })))
}
