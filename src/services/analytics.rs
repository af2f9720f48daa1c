use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::entities::{listening_history, top_artists, top_tracks};
use crate::db::{ListeningHistory, TopArtists, TopTracks};
use crate::db::enums::TimeRange;
use crate::error::{AppError, Result};

/// Rank weight is `RANK_WEIGHT_BASE - rank`, floored at 1: rank 1 weighs
/// 50, rank 50 weighs 1, anything beyond clamps to 1. A policy choice,
/// not a provider contract.
pub const RANK_WEIGHT_BASE: i32 = 51;

/// Number of genres returned by the distribution.
pub const GENRE_CHART_SIZE: usize = 15;

/// Number of discoveries returned per month.
pub const DISCOVERY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreShare {
    pub genre: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discovery {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_image: Option<String>,
    pub first_played_at: DateTime<Utc>,
    pub play_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardArtist {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardTrack {
    pub name: String,
    pub artist: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub top_artist: Option<DashboardArtist>,
    pub top_track: Option<DashboardTrack>,
    pub total_listens: u64,
    pub top_genre: Option<String>,
    pub genre_count: usize,
}

/// Derived aggregates over the stored snapshots and history.
pub struct AnalyticsService {
    db: DatabaseConnection,
}

impl AnalyticsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rank-weighted genre histogram over the stored top artists of one
    /// window. Every genre of an artist receives the artist's full
    /// weight. Percentages are relative to the top-15 total, one decimal.
    pub async fn genre_distribution(
        &self,
        user_id: Uuid,
        time_range: TimeRange,
    ) -> Result<Vec<GenreShare>> {
        let artists = TopArtists::find()
            .filter(top_artists::Column::UserId.eq(user_id))
            .filter(top_artists::Column::TimeRange.eq(time_range.as_str()))
            .all(&self.db)
            .await?;

        let weighted: Vec<(Vec<String>, i32)> = artists
            .iter()
            .map(|a| (a.genre_list(), a.rank))
            .collect();

        Ok(weigh_genres(weighted))
    }

    /// Tracks first ever played within the last calendar month, grouped
    /// by track, ordered by play count, top 20.
    pub async fn monthly_discoveries(&self, user_id: Uuid) -> Result<Vec<Discovery>> {
        let cutoff = Utc::now()
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| AppError::Internal("Month arithmetic overflow".to_string()))?;

        let recent = ListeningHistory::find()
            .filter(listening_history::Column::UserId.eq(user_id))
            .filter(listening_history::Column::PlayedAt.gte(cutoff))
            .order_by_asc(listening_history::Column::PlayedAt)
            .all(&self.db)
            .await?;

        let older_track_ids: Vec<String> = ListeningHistory::find()
            .filter(listening_history::Column::UserId.eq(user_id))
            .filter(listening_history::Column::PlayedAt.lt(cutoff))
            .select_only()
            .column(listening_history::Column::TrackId)
            .into_tuple()
            .all(&self.db)
            .await?;

        let older: HashSet<String> = older_track_ids.into_iter().collect();

        Ok(collect_discoveries(recent, &older))
    }

    /// Flattened dashboard summary. The component queries run in
    /// parallel; the shortest window is used for the headline entries.
    pub async fn dashboard_stats(&self, user_id: Uuid) -> Result<DashboardStats> {
        let top_artist_query = async {
            TopArtists::find()
                .filter(top_artists::Column::UserId.eq(user_id))
                .filter(top_artists::Column::TimeRange.eq(TimeRange::ShortTerm.as_str()))
                .filter(top_artists::Column::Rank.eq(1))
                .one(&self.db)
                .await
                .map_err(AppError::from)
        };
        let top_track_query = async {
            TopTracks::find()
                .filter(top_tracks::Column::UserId.eq(user_id))
                .filter(top_tracks::Column::TimeRange.eq(TimeRange::ShortTerm.as_str()))
                .filter(top_tracks::Column::Rank.eq(1))
                .one(&self.db)
                .await
                .map_err(AppError::from)
        };
        let total_listens_query = async {
            ListeningHistory::find()
                .filter(listening_history::Column::UserId.eq(user_id))
                .count(&self.db)
                .await
                .map_err(AppError::from)
        };

        let (top_artist, top_track, total_listens, genres) = tokio::try_join!(
            top_artist_query,
            top_track_query,
            total_listens_query,
            self.genre_distribution(user_id, TimeRange::ShortTerm),
        )?;

        Ok(DashboardStats {
            top_artist: top_artist.map(|a| DashboardArtist {
                name: a.name,
                image: a.image_url,
            }),
            top_track: top_track.map(|t| DashboardTrack {
                name: t.name,
                artist: t.artist_name,
                image: t.album_image,
            }),
            total_listens,
            top_genre: genres.first().map(|g| g.genre.clone()),
            genre_count: genres.len(),
        })
    }
}

pub(crate) fn rank_weight(rank: i32) -> i64 {
    (RANK_WEIGHT_BASE - rank).max(1) as i64
}

/// Pure aggregation half of `genre_distribution`. Equal weights are
/// ordered by genre name ascending to keep the output deterministic.
fn weigh_genres(artists: Vec<(Vec<String>, i32)>) -> Vec<GenreShare> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for (genres, rank) in artists {
        let weight = rank_weight(rank);
        for genre in genres {
            *counts.entry(genre).or_insert(0) += weight;
        }
    }

    let mut sorted: Vec<(String, i64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(GENRE_CHART_SIZE);

    let total: i64 = sorted.iter().map(|(_, count)| count).sum();

    sorted
        .into_iter()
        .map(|(genre, count)| GenreShare {
            genre,
            count,
            percentage: if total > 0 {
                ((count as f64 / total as f64) * 1000.0).round() / 10.0
            } else {
                0.0
            },
        })
        .collect()
}

/// Pure grouping half of `monthly_discoveries`: recent plays whose track
/// never appears before the cutoff, grouped per track with the earliest
/// recent play kept as `first_played_at`.
fn collect_discoveries(
    recent: Vec<listening_history::Model>,
    older_track_ids: &HashSet<String>,
) -> Vec<Discovery> {
    let mut discoveries: HashMap<String, Discovery> = HashMap::new();

    // `recent` arrives in ascending played_at order, so the first entry
    // per track carries the earliest timestamp.
    for item in recent {
        if older_track_ids.contains(&item.track_id) {
            continue;
        }
        discoveries
            .entry(item.track_id.clone())
            .and_modify(|d| d.play_count += 1)
            .or_insert_with(|| Discovery {
                track_id: item.track_id,
                track_name: item.track_name,
                artist_name: item.artist_name,
                album_image: item.album_image,
                first_played_at: item.played_at.with_timezone(&Utc),
                play_count: 1,
            });
    }

    let mut result: Vec<Discovery> = discoveries.into_values().collect();
    result.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| a.first_played_at.cmp(&b.first_played_at))
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    result.truncate(DISCOVERY_LIMIT);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn history_item(track_id: &str, played_at: DateTime<Utc>) -> listening_history::Model {
        listening_history::Model {
            id: 0,
            user_id: Uuid::new_v4(),
            track_id: track_id.to_string(),
            track_name: format!("track {}", track_id),
            artist_name: "artist".to_string(),
            album_image: None,
            played_at: played_at.into(),
        }
    }

    #[test]
    fn test_rank_weight_clamps_to_one() {
        assert_eq!(rank_weight(1), 50);
        assert_eq!(rank_weight(50), 1);
        assert_eq!(rank_weight(51), 1);
        assert_eq!(rank_weight(120), 1);
    }

    #[test]
    fn test_single_artist_weights_each_genre_in_full() {
        let shares = weigh_genres(vec![(vec!["a".to_string(), "b".to_string()], 1)]);

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].count, 50);
        assert_eq!(shares[1].count, 50);
        assert_eq!(shares[0].percentage, 50.0);
        assert_eq!(shares[1].percentage, 50.0);
    }

    #[test]
    fn test_equal_weights_order_by_genre_name() {
        let shares = weigh_genres(vec![(
            vec!["zydeco".to_string(), "ambient".to_string()],
            1,
        )]);

        assert_eq!(shares[0].genre, "ambient");
        assert_eq!(shares[1].genre, "zydeco");
    }

    #[test]
    fn test_distribution_truncates_to_chart_size() {
        let genres: Vec<String> = (0..20).map(|i| format!("genre{:02}", i)).collect();
        let shares = weigh_genres(vec![(genres, 1)]);

        assert_eq!(shares.len(), GENRE_CHART_SIZE);
        assert_eq!(shares[0].genre, "genre00");
        assert_eq!(shares.last().unwrap().genre, "genre14");
    }

    #[test]
    fn test_percentages_relative_to_top_slice() {
        let shares = weigh_genres(vec![
            (vec!["rock".to_string()], 1),
            (vec!["pop".to_string()], 55),
        ]);

        assert_eq!(shares[0].genre, "rock");
        assert_eq!(shares[0].count, 50);
        assert_eq!(shares[0].percentage, 98.0);
        assert_eq!(shares[1].genre, "pop");
        assert_eq!(shares[1].count, 1);
        assert_eq!(shares[1].percentage, 2.0);
    }

    #[test]
    fn test_track_with_older_play_is_not_a_discovery() {
        let now = Utc::now();
        let older: HashSet<String> = ["x".to_string()].into_iter().collect();
        let recent = vec![history_item("x", now)];

        assert!(collect_discoveries(recent, &older).is_empty());
    }

    #[test]
    fn test_discovery_groups_plays_and_keeps_earliest() {
        let now = Utc::now();
        let first = now - chrono::Duration::days(20);
        let recent = vec![
            history_item("y", first),
            history_item("y", now - chrono::Duration::days(10)),
            history_item("y", now),
            history_item("z", now),
        ];

        let discoveries = collect_discoveries(recent, &HashSet::new());

        assert_eq!(discoveries.len(), 2);
        assert_eq!(discoveries[0].track_id, "y");
        assert_eq!(discoveries[0].play_count, 3);
        assert_eq!(discoveries[0].first_played_at, first);
        assert_eq!(discoveries[1].track_id, "z");
        assert_eq!(discoveries[1].play_count, 1);
    }
}
