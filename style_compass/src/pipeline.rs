//! Fetch → merge → snapshot, behind the result cache.
//!
//! [`Pipeline::load`] is the only entry point the presentation layer needs. It
//! never returns an error: every failure is folded into a [`DashboardState`]
//! that is either "data unavailable" or "insufficient history". Error detail
//! (URLs, transport messages) goes to the log only; the state carries an
//! [`UnavailableCause`].

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use index_ingestor::{
    models::request_params::SeriesRequest,
    providers::{DataProvider, ProviderError},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    aggregate::{AggregateError, MA_WINDOW, MergedTable, Snapshot, derive_snapshot, latest_delta, merge},
    cache::ResultCache,
};

/// Which side of the ratio a series feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesRole {
    Growth,
    Value,
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Growth => f.write_str("growth"),
            SeriesRole::Value => f.write_str("value"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// One of the two series could not be fetched from any endpoint.
    #[error("{role} series unavailable: {source}")]
    UpstreamUnavailable {
        role: SeriesRole,
        #[source]
        source: ProviderError,
    },

    /// Both series arrived but have no date in common.
    #[error("growth and value series share no dates")]
    JoinEmpty,
}

impl PipelineError {
    pub fn cause(&self) -> UnavailableCause {
        match self {
            PipelineError::UpstreamUnavailable { role, .. } => {
                UnavailableCause::Upstream { role: *role }
            }
            PipelineError::JoinEmpty => UnavailableCause::JoinEmpty,
        }
    }
}

/// Why there is nothing to show, without the underlying error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableCause {
    /// A series could not be fetched from any endpoint.
    Upstream { role: SeriesRole },
    /// Both series arrived but share no dates.
    JoinEmpty,
}

/// The merged table plus the moment it was fetched. This is what gets cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioHistory {
    pub table: MergedTable,
    pub fetched_at: DateTime<Utc>,
}

/// Everything the page can show, one variant per user-visible state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardState {
    Ready {
        history: Arc<RatioHistory>,
        snapshot: Snapshot,
    },
    /// History exists but is too short for a regime.
    InsufficientHistory {
        history: Arc<RatioHistory>,
        available: usize,
        required: usize,
        /// Present once there are at least two rows.
        delta: Option<f64>,
    },
    /// Fetching failed or the series did not overlap; retry later.
    Unavailable { cause: UnavailableCause },
}

impl DashboardState {
    /// Classifies a merged history.
    pub fn from_history(history: Arc<RatioHistory>) -> Self {
        match derive_snapshot(&history.table) {
            Ok(snapshot) => DashboardState::Ready { history, snapshot },
            Err(AggregateError::InsufficientData {
                available,
                required,
            }) => {
                let delta = latest_delta(&history.table).ok();
                DashboardState::InsufficientHistory {
                    history,
                    available,
                    required,
                    delta,
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DashboardState::Ready { .. })
    }

    pub fn history(&self) -> Option<&RatioHistory> {
        match self {
            DashboardState::Ready { history, .. }
            | DashboardState::InsufficientHistory { history, .. } => Some(history),
            DashboardState::Unavailable { .. } => None,
        }
    }
}

pub struct Pipeline {
    provider: Arc<dyn DataProvider>,
    growth: SeriesRequest,
    value: SeriesRequest,
    cache: ResultCache<RatioHistory>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        growth: SeriesRequest,
        value: SeriesRequest,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            growth,
            value,
            cache: ResultCache::new(cache_ttl),
        }
    }

    pub fn cache(&self) -> &ResultCache<RatioHistory> {
        &self.cache
    }

    /// Runs fetch and merge once, bypassing the cache.
    ///
    /// The two fetches are independent and run concurrently.
    pub async fn run(&self) -> Result<RatioHistory, PipelineError> {
        let (growth, value) = tokio::join!(
            self.provider.fetch_series(&self.growth),
            self.provider.fetch_series(&self.value),
        );
        let growth = growth.map_err(|source| upstream_unavailable(SeriesRole::Growth, source))?;
        let value = value.map_err(|source| upstream_unavailable(SeriesRole::Value, source))?;

        let table = merge(&growth, &value);
        if table.is_empty() {
            warn!(
                growth_rows = growth.len(),
                value_rows = value.len(),
                "merged table is empty"
            );
            return Err(PipelineError::JoinEmpty);
        }

        info!(
            rows = table.len(),
            ma_ready = table.len() >= MA_WINDOW,
            "ratio history computed"
        );
        Ok(RatioHistory {
            table,
            fetched_at: Utc::now(),
        })
    }

    /// Cached history when fresh, otherwise a new run.
    pub async fn load(&self) -> DashboardState {
        match self.cache.get_or_populate(|| self.run()).await {
            Ok(history) => DashboardState::from_history(history),
            Err(e) => {
                error!(error = %e, "dashboard data unavailable");
                DashboardState::Unavailable { cause: e.cause() }
            }
        }
    }

    /// Drops the cached history and loads again.
    pub async fn force_refresh(&self) -> DashboardState {
        self.cache.invalidate();
        self.load().await
    }
}

fn upstream_unavailable(role: SeriesRole, source: ProviderError) -> PipelineError {
    warn!(%role, index = %source.index(), "series fetch exhausted");
    PipelineError::UpstreamUnavailable { role, source }
}
