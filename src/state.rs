use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::jobs::JobQueue;
use crate::services::SpotifyClient;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    /// Application-wide provider client. Clones share one rate limiter,
    /// so the outbound budget is enforced across handlers and jobs.
    pub spotify: SpotifyClient,
    pub job_queue: JobQueue,
    /// Pending OAuth `state` values awaiting the provider callback,
    /// keyed by the random state with their creation time for expiry.
    pub auth_states: Arc<Mutex<HashMap<String, Instant>>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, job_queue: JobQueue) -> Self {
        let spotify = SpotifyClient::new(&config);
        Self {
            db,
            config: Arc::new(config),
            spotify,
            job_queue,
            auth_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
