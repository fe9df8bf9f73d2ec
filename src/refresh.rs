/// Periodic fetch+parse cycle driving the shared snapshot.
///
/// One cycle is in flight at a time: the loop fetches, parses, publishes the
/// outcome, then sleeps for the configured interval. Cycles are independent,
/// and each outcome fully replaces the previous one.
use crate::fetch::{FetchError, MetricsClient};
use crate::model::MetricsRecord;
use crate::parser::{self, ParseError};
use crate::snapshot::SharedSnapshot;
use std::time::Duration;

/// A refresh cycle failure, keeping the fetch and parse layers distinct.
#[derive(Debug)]
pub enum RefreshError {
    Fetch(FetchError),
    Parse(ParseError),
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Pass the layer's own message through unchanged; the consuming
        // layer presents it verbatim
        match self {
            RefreshError::Fetch(e) => write!(f, "{e}"),
            RefreshError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RefreshError::Fetch(e) => Some(e),
            RefreshError::Parse(e) => Some(e),
        }
    }
}

/// Run one fetch+parse cycle and return the fresh record.
pub async fn refresh_once(client: &MetricsClient) -> Result<MetricsRecord, RefreshError> {
    let text = client.fetch_raw().await.map_err(RefreshError::Fetch)?;
    parser::parse_metrics(&text).map_err(RefreshError::Parse)
}

/// Run refresh cycles forever, publishing each outcome to the snapshot.
///
/// The first cycle runs immediately so the API has data as soon as the
/// upstream allows.
pub fn spawn_refresh_loop(
    client: MetricsClient,
    snapshot: SharedSnapshot,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            endpoint = %client.endpoint(),
            interval_secs = interval.as_secs(),
            "refresh loop started"
        );
        loop {
            match refresh_once(&client).await {
                Ok(record) => {
                    tracing::info!("metrics refreshed");
                    snapshot.write().await.record_success(record);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "metrics refresh failed");
                    snapshot.write().await.record_failure(e.to_string());
                }
            }
            tokio::time::sleep(interval).await;
        }
    })
}
