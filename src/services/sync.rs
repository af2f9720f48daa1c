use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::entities::{listening_history, top_artists, top_tracks, Users};
use crate::db::enums::TimeRange;
use crate::db::{ListeningHistory, TopArtists, TopTracks};
use crate::error::{AppError, Result};
use crate::services::spotify::{
    CreatedPlaylist, RecentlyPlayedResponse, SpotifyArtist, SpotifyClient, SpotifyTrack,
    TopItemsResponse,
};
use crate::services::token::TokenManager;

/// Page size for every "top"/"recently played" fetch. Provider caps at 50.
pub const TOP_ITEMS_LIMIT: usize = 50;

/// How many of the most recent stored `played_at` timestamps to load as
/// the dedup window. The provider page is at most 50, so a 100-item
/// lookback covers overlap even when sync runs are irregular, without
/// scanning the full history table.
pub const HISTORY_DEDUP_WINDOW: u64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistExport {
    pub playlist_id: String,
    pub playlist_url: String,
    pub track_count: usize,
    pub name: String,
}

/// Fetch-reconcile-store pipeline for the three listening-data categories.
///
/// Top artist/track snapshots are wholly replaced per (user, time range);
/// listening history is append-only, deduplicated by `played_at`.
pub struct SyncService {
    db: DatabaseConnection,
    spotify: SpotifyClient,
    tokens: TokenManager,
}

impl SyncService {
    /// Clones of `spotify` share one rate limiter, so callers should pass
    /// the application-wide client rather than constructing a new one.
    pub fn new(db: DatabaseConnection, spotify: SpotifyClient) -> Self {
        let tokens = TokenManager::new(db.clone(), spotify.clone());
        Self {
            db,
            spotify,
            tokens,
        }
    }

    /// Authenticated GET against the data API, resolving a fresh token
    /// through the token manager on every call.
    async fn request<T: DeserializeOwned>(
        &self,
        user_id: Uuid,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let access_token = self.tokens.get_valid_access_token(user_id).await?;
        self.spotify.get_json(endpoint, params, &access_token).await
    }

    /// Fetch the user's top artists for the window and replace the stored
    /// snapshot. Provider order is authoritative: rank = index + 1.
    pub async fn sync_top_artists(&self, user_id: Uuid, time_range: TimeRange) -> Result<usize> {
        tracing::info!(
            "Fetching top artists for user {}, range: {}",
            user_id,
            time_range.as_str()
        );

        let limit = TOP_ITEMS_LIMIT.to_string();
        let data: TopItemsResponse<SpotifyArtist> = self
            .request(
                user_id,
                "/me/top/artists",
                &[("time_range", time_range.as_str()), ("limit", &limit)],
            )
            .await?;

        let now = Utc::now();
        let rows: Vec<top_artists::ActiveModel> = data
            .items
            .into_iter()
            .enumerate()
            .map(|(index, artist)| top_artists::ActiveModel {
                user_id: Set(user_id),
                spotify_id: Set(artist.id),
                name: Set(artist.name),
                image_url: Set(artist.images.first().map(|img| img.url.clone())),
                genres: Set(artist.genres.into()),
                popularity: Set(artist.popularity),
                time_range: Set(time_range.as_str().to_string()),
                rank: Set(index as i32 + 1),
                created_at: Set(now.into()),
                ..Default::default()
            })
            .collect();
        let count = rows.len();

        // Delete-then-insert as one transaction so a reader never sees a
        // mixed old/new snapshot.
        let txn = self.db.begin().await?;
        TopArtists::delete_many()
            .filter(top_artists::Column::UserId.eq(user_id))
            .filter(top_artists::Column::TimeRange.eq(time_range.as_str()))
            .exec(&txn)
            .await?;
        if !rows.is_empty() {
            TopArtists::insert_many(rows).exec(&txn).await?;
        }
        txn.commit().await?;

        Ok(count)
    }

    /// Fetch the user's top tracks for the window and replace the stored
    /// snapshot. `artist_name` joins all credited artists.
    pub async fn sync_top_tracks(&self, user_id: Uuid, time_range: TimeRange) -> Result<usize> {
        tracing::info!(
            "Fetching top tracks for user {}, range: {}",
            user_id,
            time_range.as_str()
        );

        let limit = TOP_ITEMS_LIMIT.to_string();
        let data: TopItemsResponse<SpotifyTrack> = self
            .request(
                user_id,
                "/me/top/tracks",
                &[("time_range", time_range.as_str()), ("limit", &limit)],
            )
            .await?;

        let now = Utc::now();
        let rows: Vec<top_tracks::ActiveModel> = data
            .items
            .into_iter()
            .enumerate()
            .map(|(index, track)| top_tracks::ActiveModel {
                user_id: Set(user_id),
                spotify_id: Set(track.id),
                name: Set(track.name),
                artist_name: Set(joined_artist_names(&track.artists)),
                album_name: Set(track.album.name),
                album_image: Set(track.album.images.first().map(|img| img.url.clone())),
                preview_url: Set(track.preview_url),
                duration_ms: Set(track.duration_ms),
                time_range: Set(time_range.as_str().to_string()),
                rank: Set(index as i32 + 1),
                created_at: Set(now.into()),
                ..Default::default()
            })
            .collect();
        let count = rows.len();

        let txn = self.db.begin().await?;
        TopTracks::delete_many()
            .filter(top_tracks::Column::UserId.eq(user_id))
            .filter(top_tracks::Column::TimeRange.eq(time_range.as_str()))
            .exec(&txn)
            .await?;
        if !rows.is_empty() {
            TopTracks::insert_many(rows).exec(&txn).await?;
        }
        txn.commit().await?;

        Ok(count)
    }

    /// Fetch the most recent play events and append the ones not already
    /// stored, deduplicating against the last `HISTORY_DEDUP_WINDOW`
    /// stored `played_at` values. Returns the number appended.
    pub async fn sync_recently_played(&self, user_id: Uuid) -> Result<usize> {
        tracing::info!("Fetching recently played for user {}", user_id);

        let limit = TOP_ITEMS_LIMIT.to_string();
        let data: RecentlyPlayedResponse = self
            .request(user_id, "/me/player/recently-played", &[("limit", &limit)])
            .await?;

        let recent_played_at: Vec<chrono::DateTime<chrono::FixedOffset>> =
            ListeningHistory::find()
                .filter(listening_history::Column::UserId.eq(user_id))
                .order_by_desc(listening_history::Column::PlayedAt)
                .limit(HISTORY_DEDUP_WINDOW)
                .select_only()
                .column(listening_history::Column::PlayedAt)
                .into_tuple()
                .all(&self.db)
                .await?;

        let existing: HashSet<DateTime<Utc>> = recent_played_at
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .collect();

        let rows: Vec<listening_history::ActiveModel> = data
            .items
            .into_iter()
            .filter(|item| !existing.contains(&item.played_at))
            .map(|item| listening_history::ActiveModel {
                user_id: Set(user_id),
                track_id: Set(item.track.id),
                track_name: Set(item.track.name),
                artist_name: Set(joined_artist_names(&item.track.artists)),
                album_image: Set(item.track.album.images.first().map(|img| img.url.clone())),
                played_at: Set(item.played_at.into()),
                ..Default::default()
            })
            .collect();
        let count = rows.len();

        if !rows.is_empty() {
            ListeningHistory::insert_many(rows).exec(&self.db).await?;
        }

        tracing::debug!("Appended {} new history items for user {}", count, user_id);
        Ok(count)
    }

    /// Run every category sync for one user concurrently: both top
    /// categories across all three windows, plus recently played. Every
    /// sync runs to completion even when a sibling fails, so successful
    /// categories keep their writes; the first error is propagated
    /// afterwards.
    pub async fn refresh_all(&self, user_id: Uuid) -> Result<()> {
        tracing::info!("Refreshing all data for user {}", user_id);

        let results = tokio::join!(
            self.sync_top_artists(user_id, TimeRange::ShortTerm),
            self.sync_top_artists(user_id, TimeRange::MediumTerm),
            self.sync_top_artists(user_id, TimeRange::LongTerm),
            self.sync_top_tracks(user_id, TimeRange::ShortTerm),
            self.sync_top_tracks(user_id, TimeRange::MediumTerm),
            self.sync_top_tracks(user_id, TimeRange::LongTerm),
            self.sync_recently_played(user_id),
        );

        let (r0, r1, r2, r3, r4, r5, r6) = results;
        for result in [r0, r1, r2, r3, r4, r5, r6] {
            result?;
        }

        Ok(())
    }

    pub async fn get_top_artists(
        &self,
        user_id: Uuid,
        time_range: TimeRange,
    ) -> Result<Vec<top_artists::Model>> {
        Ok(TopArtists::find()
            .filter(top_artists::Column::UserId.eq(user_id))
            .filter(top_artists::Column::TimeRange.eq(time_range.as_str()))
            .order_by_asc(top_artists::Column::Rank)
            .all(&self.db)
            .await?)
    }

    pub async fn get_top_tracks(
        &self,
        user_id: Uuid,
        time_range: TimeRange,
    ) -> Result<Vec<top_tracks::Model>> {
        Ok(TopTracks::find()
            .filter(top_tracks::Column::UserId.eq(user_id))
            .filter(top_tracks::Column::TimeRange.eq(time_range.as_str()))
            .order_by_asc(top_tracks::Column::Rank)
            .all(&self.db)
            .await?)
    }

    pub async fn get_recently_played(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<listening_history::Model>> {
        Ok(ListeningHistory::find()
            .filter(listening_history::Column::UserId.eq(user_id))
            .order_by_desc(listening_history::Column::PlayedAt)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Export the stored top tracks for a window as a new private
    /// playlist on the provider, in stored rank order.
    ///
    /// Fails with `NoTracksAvailable` before any outbound call when the
    /// stored set is empty. The create/add-tracks pair has no local
    /// rollback: a failure after the create leaves an empty playlist on
    /// the provider side.
    pub async fn export_top_tracks_as_playlist(
        &self,
        user_id: Uuid,
        time_range: TimeRange,
        name: Option<String>,
    ) -> Result<PlaylistExport> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::UserNotFound(user_id))?;

        let tracks = self.get_top_tracks(user_id, time_range).await?;
        if tracks.is_empty() {
            return Err(AppError::NoTracksAvailable);
        }

        let access_token = self.tokens.get_valid_access_token(user_id).await?;

        let label = time_range.label();
        let playlist_name = name.unwrap_or_else(|| format!("Mini Wrapped - {}", label));
        let description = format!("{} en çok dinlediğim şarkılar • Mini Wrapped", label);

        let created: CreatedPlaylist = self
            .spotify
            .post_json(
                &format!("/users/{}/playlists", user.spotify_id),
                &json!({
                    "name": playlist_name,
                    "description": description,
                    "public": false,
                }),
                &access_token,
            )
            .await?;

        let uris: Vec<String> = tracks
            .iter()
            .take(TOP_ITEMS_LIMIT)
            .map(|t| format!("spotify:track:{}", t.spotify_id))
            .collect();

        let _: serde_json::Value = self
            .spotify
            .post_json(
                &format!("/playlists/{}/tracks", created.id),
                &json!({ "uris": uris }),
                &access_token,
            )
            .await?;

        tracing::info!(
            "Exported {} tracks to playlist {} for user {}",
            uris.len(),
            created.id,
            user_id
        );

        Ok(PlaylistExport {
            playlist_id: created.id,
            playlist_url: created.external_urls.spotify,
            track_count: uris.len(),
            name: playlist_name,
        })
    }
}

fn joined_artist_names(artists: &[SpotifyArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(name: &str) -> SpotifyArtist {
        SpotifyArtist {
            id: "id".to_string(),
            name: name.to_string(),
            genres: vec![],
            popularity: 0,
            images: vec![],
        }
    }

    #[test]
    fn test_joined_artist_names() {
        assert_eq!(joined_artist_names(&[artist("Solo")]), "Solo");
        assert_eq!(
            joined_artist_names(&[artist("A"), artist("B"), artist("C")]),
            "A, B, C"
        );
        assert_eq!(joined_artist_names(&[]), "");
    }
}
