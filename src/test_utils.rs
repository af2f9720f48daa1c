//! Test utilities for Mini Wrapped
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory SQLite databases (one per test)
//! - Configs pointed at a mock provider
//! - Test data generators

use chrono::{DateTime, Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::{
    config::Config,
    db::entities::{listening_history, top_artists, top_tracks, users},
    db::enums::TimeRange,
};

/// Setup an in-memory SQLite database with all migrations applied
///
/// Each call creates a fresh, isolated database perfect for parallel testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run all migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 3001,
        spotify_client_id: "test_client_id".to_string(),
        spotify_client_secret: "test_client_secret".to_string(),
        spotify_redirect_uri: "http://localhost:3001/api/auth/spotify/callback".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
        spotify_api_base: "http://localhost:9/v1".to_string(),
        spotify_accounts_base: "http://localhost:9".to_string(),
    }
}

/// Create a test configuration with both provider bases pointed at a
/// wiremock server
pub fn test_config_with_provider(base_url: &str) -> Config {
    Config {
        spotify_api_base: base_url.to_string(),
        spotify_accounts_base: base_url.to_string(),
        ..test_config()
    }
}

// ============================================================================
// Test Data Factories
// ============================================================================

/// Create a test user whose access token expires `expires_in` from now
pub async fn create_test_user(db: &DatabaseConnection, expires_in: Duration) -> users::Model {
    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        spotify_id: Set(format!("spotify_user_{}", Uuid::new_v4().simple())),
        display_name: Set("Test User".to_string()),
        email: Set(Some("test@example.com".to_string())),
        profile_image: Set(None),
        access_token: Set("test_access_token".to_string()),
        refresh_token: Set("test_refresh_token".to_string()),
        token_expires_at: Set((now + expires_in).into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    user.insert(db).await.expect("Failed to insert test user")
}

/// Create a test top-artist row
pub async fn create_test_top_artist(
    db: &DatabaseConnection,
    user_id: Uuid,
    time_range: TimeRange,
    rank: i32,
    genres: &[&str],
) -> top_artists::Model {
    let genres: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
    let artist = top_artists::ActiveModel {
        user_id: Set(user_id),
        spotify_id: Set(format!("artist_{}", rank)),
        name: Set(format!("Artist {}", rank)),
        image_url: Set(None),
        genres: Set(genres.into()),
        popularity: Set(50),
        time_range: Set(time_range.as_str().to_string()),
        rank: Set(rank),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    artist
        .insert(db)
        .await
        .expect("Failed to insert test top artist")
}

/// Create a test top-track row
pub async fn create_test_top_track(
    db: &DatabaseConnection,
    user_id: Uuid,
    time_range: TimeRange,
    rank: i32,
) -> top_tracks::Model {
    let track = top_tracks::ActiveModel {
        user_id: Set(user_id),
        spotify_id: Set(format!("track_{}", rank)),
        name: Set(format!("Track {}", rank)),
        artist_name: Set("Test Artist".to_string()),
        album_name: Set("Test Album".to_string()),
        album_image: Set(None),
        preview_url: Set(None),
        duration_ms: Set(200_000),
        time_range: Set(time_range.as_str().to_string()),
        rank: Set(rank),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    track
        .insert(db)
        .await
        .expect("Failed to insert test top track")
}

/// Create a test listening-history row
pub async fn create_test_history(
    db: &DatabaseConnection,
    user_id: Uuid,
    track_id: &str,
    played_at: DateTime<Utc>,
) -> listening_history::Model {
    let item = listening_history::ActiveModel {
        user_id: Set(user_id),
        track_id: Set(track_id.to_string()),
        track_name: Set(format!("Track {}", track_id)),
        artist_name: Set("Test Artist".to_string()),
        album_image: Set(None),
        played_at: Set(played_at.into()),
        ..Default::default()
    };

    item.insert(db)
        .await
        .expect("Failed to insert test history item")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        let users = users::Entity::find().all(&db).await.unwrap();
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn test_create_test_user() {
        let db = setup_test_db().await;
        let user = create_test_user(&db, Duration::hours(1)).await;

        assert_eq!(user.display_name, "Test User");
        assert!(user.token_expires_at.with_timezone(&Utc) > Utc::now());
    }

    #[tokio::test]
    async fn test_parallel_databases() {
        // Run two database setups in parallel - they should not interfere
        let (db1, db2) = tokio::join!(setup_test_db(), setup_test_db());

        let user1 = create_test_user(&db1, Duration::hours(1)).await;
        create_test_top_artist(&db1, user1.id, TimeRange::ShortTerm, 1, &["rock"]).await;

        let db1_artists = top_artists::Entity::find().all(&db1).await.unwrap();
        let db2_artists = top_artists::Entity::find().all(&db2).await.unwrap();

        assert_eq!(db1_artists.len(), 1);
        assert_eq!(db2_artists.len(), 0);
    }
}
