pub mod analytics;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod spotify;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth endpoints
        .route("/auth/spotify/authorize", get(auth::authorize))
        .route("/auth/spotify/callback", get(auth::callback))
        // Sync endpoints
        .route("/spotify/:user_id/refresh", post(spotify::refresh_all))
        .route("/spotify/:user_id/top-artists", get(spotify::top_artists))
        .route("/spotify/:user_id/top-tracks", get(spotify::top_tracks))
        .route(
            "/spotify/:user_id/recently-played",
            get(spotify::recently_played),
        )
        .route("/spotify/:user_id/playlist", post(spotify::export_playlist))
        // Analytics endpoints
        .route(
            "/analytics/:user_id/genres",
            get(analytics::genre_distribution),
        )
        .route(
            "/analytics/:user_id/discoveries",
            get(analytics::monthly_discoveries),
        )
        .route("/analytics/:user_id/dashboard", get(analytics::dashboard))
        // User endpoints
        .route(
            "/users/:user_id",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/users/:user_id/stats", get(users::user_stats))
        // Job endpoints
        .route("/jobs/refresh-all", post(jobs::refresh_all_users))
        .route("/jobs/stats", get(jobs::queue_stats))
}
