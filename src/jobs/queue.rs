use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    RefreshUserData,
}

/// Message sent to the job queue
#[derive(Debug, Clone)]
pub struct JobMessage {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub user_id: Uuid,
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueDepth {
    pub waiting: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

#[derive(Debug, Default)]
pub struct QueueStats {
    waiting: AtomicI64,
    active: AtomicI64,
    completed: AtomicI64,
    failed: AtomicI64,
}

impl QueueStats {
    pub fn job_enqueued(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
    }

    pub fn job_started(&self) {
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn job_completed(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn job_failed(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn depth(&self) -> QueueDepth {
        QueueDepth {
            waiting: self.waiting.load(Ordering::SeqCst),
            active: self.active.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// In-process job queue for per-user refresh work. Delays are handled at
/// enqueue time so the executor only ever sees due work.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<JobMessage>,
    stats: Arc<QueueStats>,
}

impl JobQueue {
    /// Create a new job queue and return (queue, receiver)
    pub fn new() -> (Self, mpsc::UnboundedReceiver<JobMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                stats: Arc::new(QueueStats::default()),
            },
            receiver,
        )
    }

    /// Submit a job to the queue immediately.
    pub fn enqueue(&self, message: JobMessage) -> Result<()> {
        self.enqueue_delayed(message, Duration::ZERO)
    }

    /// Submit a job after the given delay. The job counts as waiting for
    /// the whole delay.
    pub fn enqueue_delayed(&self, message: JobMessage, delay: Duration) -> Result<()> {
        self.stats.job_enqueued();

        tracing::info!(
            "Job {} ({:?}) enqueued for user {} with delay {:?}",
            message.job_id,
            message.job_type,
            message.user_id,
            delay
        );

        if delay.is_zero() {
            return self
                .sender
                .send(message)
                .map_err(|e| AppError::Internal(format!("Failed to submit job: {}", e)));
        }

        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sender.send(message) {
                tracing::error!("Failed to submit delayed job: {}", e);
            }
        });

        Ok(())
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    pub fn queue_depth(&self) -> QueueDepth {
        self.stats.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message() -> JobMessage {
        JobMessage {
            job_id: Uuid::new_v4(),
            job_type: JobType::RefreshUserData,
            user_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_enqueue_counts_as_waiting() {
        let (queue, mut receiver) = JobQueue::new();

        queue.enqueue(message()).unwrap();
        assert_eq!(
            queue.queue_depth(),
            QueueDepth {
                waiting: 1,
                active: 0,
                completed: 0,
                failed: 0
            }
        );

        assert!(receiver.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_delayed_enqueue_delivers_after_delay() {
        let (queue, mut receiver) = JobQueue::new();

        queue
            .enqueue_delayed(message(), Duration::from_millis(10))
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("delayed job never arrived");
        assert!(received.is_some());
    }

    #[tokio::test]
    async fn test_stats_lifecycle() {
        let (queue, _receiver) = JobQueue::new();
        let stats = queue.stats();

        queue.enqueue(message()).unwrap();
        stats.job_started();
        stats.job_completed();

        queue.enqueue(message()).unwrap();
        stats.job_started();
        stats.job_failed();

        assert_eq!(
            queue.queue_depth(),
            QueueDepth {
                waiting: 0,
                active: 0,
                completed: 1,
                failed: 1
            }
        );
    }
}
