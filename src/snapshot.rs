/// Latest fetch+parse outcome, shared between the refresh task and the API.
///
/// Each cycle fully replaces the previous state. A failed cycle clears the
/// record: the API never serves stale or partially-filled data alongside an
/// error, it serves the error.
use crate::model::MetricsRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// The latest successfully parsed record, if any.
    pub metrics: Option<MetricsRecord>,
    /// When the record was last refreshed successfully.
    pub last_update: Option<DateTime<Utc>>,
    /// Why the latest cycle failed, if it did.
    pub last_error: Option<String>,
}

impl Snapshot {
    /// Replace the snapshot with a fresh record.
    pub fn record_success(&mut self, metrics: MetricsRecord) {
        self.metrics = Some(metrics);
        self.last_update = Some(Utc::now());
        self.last_error = None;
    }

    /// Replace the snapshot with a failure. No record survives; `last_update`
    /// keeps pointing at the last good refresh.
    pub fn record_failure(&mut self, error: String) {
        self.metrics = None;
        self.last_error = Some(error);
    }
}

/// Shared handle used by the refresh loop and the HTTP API.
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

pub fn shared() -> SharedSnapshot {
    Arc::new(RwLock::new(Snapshot::default()))
}
