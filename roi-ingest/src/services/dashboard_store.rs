//! Session-scoped holder for the latest dashboard summary

use roi_common::{DashboardSummary, DataSource};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest ingested summary, or nothing
///
/// Cheap to clone; all clones share the same slot.
#[derive(Clone, Default)]
pub struct DashboardStore {
    inner: Arc<RwLock<DataSource>>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> DataSource {
        self.inner.read().await.clone()
    }

    /// Replace whatever was stored with a freshly built summary
    pub async fn replace(&self, summary: DashboardSummary) {
        *self.inner.write().await = DataSource::scored(summary);
    }

    pub async fn clear(&self) {
        *self.inner.write().await = DataSource::Unscored;
    }
}
