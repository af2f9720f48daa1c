use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    services::UserService,
    state::AppState,
};

/// How long an issued OAuth `state` stays valid.
const AUTH_STATE_TTL: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

/// Start the provider redirect handshake: issue a random `state`, keep it
/// for the callback, and send the browser to the provider.
pub async fn authorize(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let spotify = state.spotify.clone();

    let auth_state = Uuid::new_v4().to_string();
    let url = spotify.authorize_url(&auth_state);

    let mut states = state.auth_states.lock().await;
    states.retain(|_, issued| issued.elapsed() < AUTH_STATE_TTL);
    states.insert(auth_state, Instant::now());

    Ok(Redirect::to(&url))
}

/// Provider callback: verify the `state`, exchange the code, upsert the
/// user, and hand off to the frontend.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Result<impl IntoResponse> {
    let issued = {
        let mut states = state.auth_states.lock().await;
        states.remove(&params.state)
    };
    match issued {
        Some(issued) if issued.elapsed() < AUTH_STATE_TTL => {}
        _ => {
            return Err(AppError::Authentication(
                "Invalid or expired state".to_string(),
            ))
        }
    }

    let spotify = state.spotify.clone();
    let tokens = spotify.exchange_code(&params.code).await?;
    let profile = spotify.get_profile(&tokens.access_token).await?;

    let users = UserService::new(state.db.clone());
    let user = users.upsert_spotify_user(&profile, &tokens).await?;

    Ok(Redirect::to(&format!(
        "{}/dashboard?user_id={}",
        state.config.frontend_url, user.id
    )))
}
