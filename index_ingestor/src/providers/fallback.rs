//! Endpoint fallback with bounded retries.
//!
//! A fetch walks the configured [`Endpoint`]s in priority order. Each endpoint
//! gets up to [`RetryPolicy::max_attempts`] tries, each bounded by that
//! endpoint's own timeout, with a short backoff between tries. Any
//! [`AttemptError`] (network, timeout, non-2xx, malformed body) moves on to the
//! next try. Only when the last endpoint's last try fails is the index reported
//! as [`ProviderError::UpstreamUnavailable`].

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::IntoError;
use tracing::{debug, error, warn};

use crate::{
    models::{request_params::SeriesRequest, series_table::SeriesTable},
    providers::{AttemptError, NoEndpointsConfiguredSnafu, ProviderError, UpstreamUnavailableSnafu},
};

/// One candidate upstream URL and the timeout applied to each request to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

/// How the pause between two tries of the same endpoint grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffMode {
    /// Always wait `backoff`.
    #[default]
    Fixed,
    /// Wait `backoff * n` after the n-th failed try.
    Linear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Tries per endpoint. Zero is treated as one.
    pub max_attempts: u32,
    pub backoff: Duration,
    pub mode: BackoffMode,
}

impl RetryPolicy {
    /// Pause after the `attempt`-th (1-based) failed try of an endpoint.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.mode {
            BackoffMode::Fixed => self.backoff,
            BackoffMode::Linear => self.backoff.saturating_mul(attempt.max(1)),
        }
    }

    fn attempts_per_endpoint(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            mode: BackoffMode::Fixed,
        }
    }
}

/// Request identity sent with every call.
///
/// Some upstreams refuse clients that don't look like a browser; what to send
/// is a deployment decision, so nothing here is hardcoded beyond the defaults
/// of the calling application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub extra_headers: IndexMap<String, String>,
}

/// Everything a provider needs to reach its upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Candidates in priority order.
    pub endpoints: Vec<Endpoint>,
    pub retry: RetryPolicy,
    pub identity: RequestIdentity,
}

/// A single try against a single endpoint.
///
/// This is the seam between the fallback loop and the wire: the HTTP provider
/// implements it with `reqwest`, tests implement it with scripted outcomes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        request: &SeriesRequest,
    ) -> Result<SeriesTable, AttemptError>;
}

/// Runs `request` against `endpoints` in order until one try succeeds.
pub async fn fetch_with_fallback<S>(
    source: &S,
    endpoints: &[Endpoint],
    retry: &RetryPolicy,
    request: &SeriesRequest,
) -> Result<SeriesTable, ProviderError>
where
    S: QuoteSource + ?Sized,
{
    let index = &request.index;
    let per_endpoint = retry.attempts_per_endpoint();
    let mut attempts = 0usize;
    let mut last_error: Option<AttemptError> = None;

    for (rank, endpoint) in endpoints.iter().enumerate() {
        for attempt in 1..=per_endpoint {
            attempts += 1;
            debug!(%index, url = %endpoint.url, rank, attempt, "fetching series");

            match source.attempt(endpoint, request).await {
                Ok(table) => {
                    debug!(%index, url = %endpoint.url, rows = table.len(), "series fetched");
                    return Ok(table);
                }
                Err(e) => {
                    warn!(
                        %index,
                        url = %endpoint.url,
                        attempt,
                        malformed = e.is_malformed(),
                        error = %e,
                        "fetch attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < per_endpoint {
                let delay = retry.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    match last_error {
        Some(last) => {
            error!(%index, attempts, "all endpoints exhausted");
            Err(UpstreamUnavailableSnafu {
                index: index.clone(),
                attempts,
            }
            .into_error(last))
        }
        None => NoEndpointsConfiguredSnafu {
            index: index.clone(),
        }
        .fail(),
    }
}
