use std::sync::Arc;

use domains::{MaintenanceRepository, Result, Status};
use tracing::warn;

pub struct MaintenanceService {
    store: Arc<dyn MaintenanceRepository>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn MaintenanceRepository>) -> Self {
        Self { store }
    }

    pub async fn status(&self) -> Result<Status> {
        self.store.status().await
    }

    /// Wipes every user, forum, thread, post and vote.
    pub async fn clear(&self) -> Result<()> {
        warn!("clearing all forum data");
        self.store.clear().await
    }
}
