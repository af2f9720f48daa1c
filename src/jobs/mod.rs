use sea_orm::{EntityTrait, QuerySelect};
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::db::entities::{users, Users};
use crate::error::Result;
use crate::state::AppState;

pub mod executor;
pub mod queue;

pub use executor::JobExecutor;
pub use queue::{JobMessage, JobQueue, JobType, QueueDepth};

/// Gap between successive per-user refresh jobs, to stay under the
/// provider rate limit when refreshing everyone.
pub const USER_REFRESH_STAGGER_MS: u64 = 5000;

/// Enqueue a refresh job for every known user, staggered.
pub async fn schedule_all_users_refresh(state: &AppState) -> Result<usize> {
    let user_ids: Vec<Uuid> = Users::find()
        .select_only()
        .column(users::Column::Id)
        .into_tuple()
        .all(&state.db)
        .await?;

    for (i, user_id) in user_ids.iter().enumerate() {
        let message = JobMessage {
            job_id: Uuid::new_v4(),
            job_type: JobType::RefreshUserData,
            user_id: *user_id,
        };
        state.job_queue.enqueue_delayed(
            message,
            Duration::from_millis(i as u64 * USER_REFRESH_STAGGER_MS),
        )?;
    }

    tracing::info!("Scheduled refresh for {} users", user_ids.len());
    Ok(user_ids.len())
}

/// Cron entry refreshing every user's data every 6 hours.
pub async fn start_scheduler(state: AppState) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let refresh_job = Job::new_async("0 0 */6 * * *", move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            if let Err(e) = schedule_all_users_refresh(&state).await {
                tracing::error!("Scheduled batch refresh failed: {}", e);
            }
        })
    })?;
    scheduler.add(refresh_job).await?;

    scheduler.start().await?;

    Ok(scheduler)
}
