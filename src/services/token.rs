use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::db::entities::{users, Users};
use crate::error::{AppError, Result};
use crate::services::spotify::SpotifyClient;

/// Minutes before expiry at which a token is treated as expired,
/// absorbing request latency between check and use.
pub const TOKEN_EXPIRY_BUFFER_MINS: i64 = 5;

/// Manages per-user provider credentials: hands out a valid access token,
/// proactively exchanging the refresh token when the stored one is about
/// to expire.
///
/// The refresh exchange is not mutex-protected per user. Two concurrent
/// calls near expiry can both refresh; the last successful write wins and
/// the loser's token may go stale until the next cycle.
pub struct TokenManager {
    db: DatabaseConnection,
    spotify: SpotifyClient,
}

impl TokenManager {
    pub fn new(db: DatabaseConnection, spotify: SpotifyClient) -> Self {
        Self { db, spotify }
    }

    pub async fn get_valid_access_token(&self, user_id: Uuid) -> Result<String> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::UserNotFound(user_id))?;

        let expiry_threshold = Utc::now() + Duration::minutes(TOKEN_EXPIRY_BUFFER_MINS);
        if user.token_expires_at.with_timezone(&Utc) < expiry_threshold {
            let refreshed = self.refresh(user).await?;
            return Ok(refreshed.access_token);
        }

        Ok(user.access_token)
    }

    /// One refresh attempt. Stored state is only mutated on success; the
    /// provider may omit a new refresh token, in which case the prior one
    /// is kept.
    async fn refresh(&self, user: users::Model) -> Result<users::Model> {
        tracing::debug!("Refreshing Spotify token for user {}", user.id);

        let token = self.spotify.refresh_token(&user.refresh_token).await?;
        let expires_at = Utc::now() + Duration::seconds(token.expires_in);

        let prior_refresh_token = user.refresh_token.clone();
        let mut active: users::ActiveModel = user.into();
        active.access_token = Set(token.access_token);
        active.refresh_token = Set(token.refresh_token.unwrap_or(prior_refresh_token));
        active.token_expires_at = Set(expires_at.into());
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }
}
