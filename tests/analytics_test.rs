//! Analytics aggregation tests against seeded database state.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use mini_wrapped::db::enums::TimeRange;
use mini_wrapped::services::AnalyticsService;
use mini_wrapped::test_utils::{
    create_test_history, create_test_top_artist, create_test_top_track, create_test_user,
    setup_test_db,
};

#[tokio::test]
async fn test_genre_distribution_weights_by_rank() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    // rank 1 weighs 50, rank 2 weighs 49
    create_test_top_artist(&db, user.id, TimeRange::ShortTerm, 1, &["rock", "indie"]).await;
    create_test_top_artist(&db, user.id, TimeRange::ShortTerm, 2, &["rock"]).await;

    let analytics = AnalyticsService::new(db.clone());
    let shares = analytics
        .genre_distribution(user.id, TimeRange::ShortTerm)
        .await
        .unwrap();

    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].genre, "rock");
    assert_eq!(shares[0].count, 99);
    assert_eq!(shares[1].genre, "indie");
    assert_eq!(shares[1].count, 50);
    // 99 / 149 and 50 / 149, one decimal
    assert_eq!(shares[0].percentage, 66.4);
    assert_eq!(shares[1].percentage, 33.6);
}

#[tokio::test]
async fn test_genre_distribution_ignores_other_windows() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    create_test_top_artist(&db, user.id, TimeRange::ShortTerm, 1, &["rock"]).await;
    create_test_top_artist(&db, user.id, TimeRange::LongTerm, 1, &["jazz"]).await;

    let analytics = AnalyticsService::new(db.clone());
    let shares = analytics
        .genre_distribution(user.id, TimeRange::ShortTerm)
        .await
        .unwrap();

    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].genre, "rock");
    assert_eq!(shares[0].percentage, 100.0);
}

#[tokio::test]
async fn test_genre_distribution_empty_without_synced_artists() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    let analytics = AnalyticsService::new(db.clone());
    let shares = analytics
        .genre_distribution(user.id, TimeRange::MediumTerm)
        .await
        .unwrap();

    assert!(shares.is_empty());
}

#[tokio::test]
async fn test_monthly_discoveries_excludes_previously_known_tracks() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    let now = Utc::now();
    // "old_favorite" was already played before the one-month cutoff, so
    // its recent plays are not discoveries.
    create_test_history(&db, user.id, "old_favorite", now - Duration::days(60)).await;
    create_test_history(&db, user.id, "old_favorite", now - Duration::days(3)).await;
    // "fresh" first appeared inside the window, three plays.
    create_test_history(&db, user.id, "fresh", now - Duration::days(10)).await;
    create_test_history(&db, user.id, "fresh", now - Duration::days(5)).await;
    create_test_history(&db, user.id, "fresh", now - Duration::days(1)).await;
    // "once" appeared inside the window, one play.
    create_test_history(&db, user.id, "once", now - Duration::days(2)).await;

    let analytics = AnalyticsService::new(db.clone());
    let discoveries = analytics.monthly_discoveries(user.id).await.unwrap();

    assert_eq!(discoveries.len(), 2);
    assert_eq!(discoveries[0].track_id, "fresh");
    assert_eq!(discoveries[0].play_count, 3);
    assert_eq!(
        discoveries[0].first_played_at.timestamp(),
        (now - Duration::days(10)).timestamp()
    );
    assert_eq!(discoveries[1].track_id, "once");
    assert_eq!(discoveries[1].play_count, 1);
}

#[tokio::test]
async fn test_monthly_discoveries_caps_at_twenty() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    let now = Utc::now();
    for i in 0..25 {
        create_test_history(
            &db,
            user.id,
            &format!("track{:02}", i),
            now - Duration::hours(i),
        )
        .await;
    }

    let analytics = AnalyticsService::new(db.clone());
    let discoveries = analytics.monthly_discoveries(user.id).await.unwrap();

    assert_eq!(discoveries.len(), 20);
}

#[tokio::test]
async fn test_dashboard_stats_composes_headline_entries() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    create_test_top_artist(&db, user.id, TimeRange::ShortTerm, 1, &["rock"]).await;
    create_test_top_artist(&db, user.id, TimeRange::ShortTerm, 2, &["pop"]).await;
    create_test_top_track(&db, user.id, TimeRange::ShortTerm, 1).await;
    let now = Utc::now();
    create_test_history(&db, user.id, "t1", now - Duration::hours(1)).await;
    create_test_history(&db, user.id, "t2", now - Duration::hours(2)).await;

    let analytics = AnalyticsService::new(db.clone());
    let stats = analytics.dashboard_stats(user.id).await.unwrap();

    assert_eq!(stats.top_artist.unwrap().name, "Artist 1");
    let top_track = stats.top_track.unwrap();
    assert_eq!(top_track.name, "Track 1");
    assert_eq!(top_track.artist, "Test Artist");
    assert_eq!(stats.total_listens, 2);
    assert_eq!(stats.top_genre.as_deref(), Some("rock"));
    assert_eq!(stats.genre_count, 2);
}

#[tokio::test]
async fn test_dashboard_stats_for_empty_user() {
    let db = setup_test_db().await;
    let user = create_test_user(&db, Duration::hours(1)).await;

    let analytics = AnalyticsService::new(db.clone());
    let stats = analytics.dashboard_stats(user.id).await.unwrap();

    assert!(stats.top_artist.is_none());
    assert!(stats.top_track.is_none());
    assert_eq!(stats.total_listens, 0);
    assert!(stats.top_genre.is_none());
    assert_eq!(stats.genre_count, 0);
}
