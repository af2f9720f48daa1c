use tokio::sync::mpsc;

use crate::jobs::queue::{JobMessage, JobType};
use crate::services::SyncService;
use crate::state::AppState;

/// Background job executor that processes jobs from the queue
pub struct JobExecutor {
    state: AppState,
    receiver: mpsc::UnboundedReceiver<JobMessage>,
}

impl JobExecutor {
    pub fn new(state: AppState, receiver: mpsc::UnboundedReceiver<JobMessage>) -> Self {
        Self { state, receiver }
    }

    /// Start the job executor loop
    pub async fn start(mut self) {
        tracing::info!("Job executor started");

        while let Some(message) = self.receiver.recv().await {
            tracing::info!(
                "Processing job {} ({:?}) for user {}",
                message.job_id,
                message.job_type,
                message.user_id
            );

            let stats = self.state.job_queue.stats();
            stats.job_started();

            // Spawn each job in its own task to allow concurrent processing
            let state = self.state.clone();
            tokio::spawn(async move {
                let result = match message.job_type {
                    JobType::RefreshUserData => {
                        let sync = SyncService::new(state.db.clone(), state.spotify.clone());
                        sync.refresh_all(message.user_id).await
                    }
                };

                match result {
                    Ok(()) => {
                        tracing::info!("Job {} completed successfully", message.job_id);
                        stats.job_completed();
                    }
                    Err(e) => {
                        tracing::error!("Job {} failed: {}", message.job_id, e);
                        stats.job_failed();
                    }
                }
            });
        }

        tracing::warn!("Job executor stopped - queue closed");
    }
}
