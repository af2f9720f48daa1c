use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::entities::{listening_history, top_artists, top_tracks, users, Users};
use crate::db::{ListeningHistory, TopArtists, TopTracks};
use crate::error::{AppError, Result};
use crate::services::spotify::{SpotifyProfile, TokenResponse};

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_artists: u64,
    pub total_tracks: u64,
    pub total_listens: u64,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<users::Model> {
        Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::UserNotFound(user_id))
    }

    pub async fn find_by_spotify_id(&self, spotify_id: &str) -> Result<Option<users::Model>> {
        Ok(Users::find()
            .filter(users::Column::SpotifyId.eq(spotify_id))
            .one(&self.db)
            .await?)
    }

    /// Upsert a user from a successful provider authentication: one
    /// record per external identity, token triple replaced every time.
    pub async fn upsert_spotify_user(
        &self,
        profile: &SpotifyProfile,
        tokens: &TokenResponse,
    ) -> Result<users::Model> {
        let display_name = profile
            .display_name
            .clone()
            .unwrap_or_else(|| "Spotify User".to_string());
        let profile_image = profile.images.first().map(|img| img.url.clone());
        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| {
            AppError::Authentication("Token response missing refresh_token".to_string())
        })?;
        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);
        let now = Utc::now();

        let user = if let Some(existing) = self.find_by_spotify_id(&profile.id).await? {
            let mut active: users::ActiveModel = existing.into();
            active.display_name = Set(display_name);
            active.email = Set(profile.email.clone());
            active.profile_image = Set(profile_image);
            active.access_token = Set(tokens.access_token.clone());
            active.refresh_token = Set(refresh_token);
            active.token_expires_at = Set(expires_at.into());
            active.updated_at = Set(now.into());
            active.update(&self.db).await?
        } else {
            let new_user = users::ActiveModel {
                id: Set(Uuid::new_v4()),
                spotify_id: Set(profile.id.clone()),
                display_name: Set(display_name),
                email: Set(profile.email.clone()),
                profile_image: Set(profile_image),
                access_token: Set(tokens.access_token.clone()),
                refresh_token: Set(refresh_token),
                token_expires_at: Set(expires_at.into()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            new_user.insert(&self.db).await?
        };

        tracing::info!("Upserted user {} (spotify {})", user.id, user.spotify_id);
        Ok(user)
    }

    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let artist_count = async {
            TopArtists::find()
                .filter(top_artists::Column::UserId.eq(user_id))
                .count(&self.db)
                .await
                .map_err(AppError::from)
        };
        let track_count = async {
            TopTracks::find()
                .filter(top_tracks::Column::UserId.eq(user_id))
                .count(&self.db)
                .await
                .map_err(AppError::from)
        };
        let listen_count = async {
            ListeningHistory::find()
                .filter(listening_history::Column::UserId.eq(user_id))
                .count(&self.db)
                .await
                .map_err(AppError::from)
        };

        let (total_artists, total_tracks, total_listens) =
            tokio::try_join!(artist_count, track_count, listen_count)?;

        Ok(UserStats {
            total_artists,
            total_tracks,
            total_listens,
        })
    }

    /// Delete a user. Owned snapshots and history rows go with it via the
    /// cascading foreign keys.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let user = self.find_by_id(user_id).await?;
        user.delete(&self.db).await?;
        tracing::info!("Deleted user {}", user_id);
        Ok(())
    }
}
