/// HTTP client for the Sofia AI upstream metrics endpoint.
///
/// A thin GET wrapper: the parser only ever consumes the resulting text
/// blob. Transport failures and non-2xx statuses surface as `FetchError`,
/// kept distinct from the parser's own failure mode so the dashboard can
/// tell "upstream unreachable" from "upstream renamed a metric".
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MetricsClient {
    /// Build a client for the given endpoint with the given request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Sofia-Dashboard/1.0")
            .build()
            .map_err(|e| FetchError::Client { source: e })?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    /// The configured upstream endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the raw exposition text. Non-2xx responses are errors; no retries.
    pub async fn fetch_raw(&self) -> Result<String, FetchError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching upstream metrics");

        let response = self
            .http
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: self.endpoint.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transport {
            endpoint: self.endpoint.clone(),
            source: e,
        })?;
        tracing::debug!(bytes = body.len(), "upstream metrics fetched");
        Ok(body)
    }
}

/// Errors from the fetch boundary.
#[derive(Debug)]
pub enum FetchError {
    /// Failed to construct the HTTP client.
    Client { source: reqwest::Error },
    /// Network failure or timeout while talking to the upstream.
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Upstream answered with a non-2xx status.
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Client { source } => {
                write!(f, "failed to build HTTP client: {source}")
            }
            FetchError::Transport { endpoint, source } => {
                write!(f, "metrics fetch from {endpoint} failed: {source}")
            }
            FetchError::Status { endpoint, status } => {
                write!(f, "metrics endpoint {endpoint} returned HTTP {status}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Client { source } => Some(source),
            FetchError::Transport { source, .. } => Some(source),
            FetchError::Status { .. } => None,
        }
    }
}
