//! Provider abstraction for index quote-history sources.
//!
//! This module defines the [`DataProvider`] trait, the single interface the
//! dashboard pipeline uses to obtain a [`SeriesTable`] for an index. Concrete
//! vendors (currently [`eastmoney`]) implement it on top of the endpoint
//! fallback and retry policy in [`fallback`].
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn DataProvider`), so tests and alternative vendors can be swapped in at
//! runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use index_ingestor::models::{request_params::SeriesRequest, series_table::SeriesTable};
//! use index_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl DataProvider for EmptyProvider {
//!     async fn fetch_series(&self, request: &SeriesRequest) -> Result<SeriesTable, ProviderError> {
//!         Ok(SeriesTable::new(request.index.clone(), Vec::new()))
//!     }
//! }
//! ```

pub mod eastmoney;
pub mod fallback;

use std::time::Duration;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{index_id::IndexId, request_params::SeriesRequest, series_table::SeriesTable};

/// Trait for fetching the closing-price history of one index.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the history described by `request`.
    ///
    /// Implementations retry and fall back internally; an `Err` means every
    /// candidate source has been exhausted.
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<SeriesTable, ProviderError>;
}

/// Failure of a single attempt against a single endpoint.
///
/// These are transient by nature: the fallback policy retries them and never
/// surfaces one on its own, only as the last cause of
/// [`ProviderError::UpstreamUnavailable`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AttemptError {
    /// The endpoint did not answer within its timeout.
    #[snafu(display("Request to {url} timed out after {timeout:?}"))]
    Timeout {
        url: String,
        timeout: Duration,
        backtrace: Backtrace,
    },

    /// Connection, TLS or body-read failure.
    #[snafu(display("Request to {url} failed: {source}"))]
    Transport {
        url: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The endpoint answered with a non-2xx status.
    #[snafu(display("Request to {url} returned HTTP {status}"))]
    Status {
        url: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// The body arrived but lacks the expected fields.
    #[snafu(display("Malformed response from {url}: {message}"))]
    Malformed {
        url: String,
        message: String,
        backtrace: Backtrace,
    },
}

impl AttemptError {
    pub fn url(&self) -> &str {
        match self {
            AttemptError::Timeout { url, .. }
            | AttemptError::Transport { url, .. }
            | AttemptError::Status { url, .. }
            | AttemptError::Malformed { url, .. } => url,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, AttemptError::Malformed { .. })
    }
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// A configured header name is not a valid HTTP token.
    #[snafu(display("Invalid header name '{name}': {source}"))]
    InvalidHeaderName {
        name: String,
        source: reqwest::header::InvalidHeaderName,
        backtrace: Backtrace,
    },

    /// A configured header value contains invalid characters.
    #[snafu(display("Invalid value for header '{name}': {source}"))]
    InvalidHeaderValue {
        name: String,
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// The policy lists no endpoint to try.
    #[snafu(display("No endpoints configured"))]
    NoEndpoints { backtrace: Backtrace },
}

/// Errors surfaced by a [`DataProvider`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Every endpoint and every retry failed for this index.
    #[snafu(display("Upstream unavailable for {index} after {attempts} attempt(s): {source}"))]
    UpstreamUnavailable {
        index: IndexId,
        attempts: usize,
        #[snafu(source(from(AttemptError, Box::new)))]
        source: Box<AttemptError>,
    },

    /// There was nothing to try.
    #[snafu(display("No endpoints configured for {index}"))]
    NoEndpointsConfigured { index: IndexId },
}

impl ProviderError {
    pub fn index(&self) -> &IndexId {
        match self {
            ProviderError::UpstreamUnavailable { index, .. }
            | ProviderError::NoEndpointsConfigured { index } => index,
        }
    }

    /// The error of the final attempt, if any attempt was made.
    pub fn last_attempt(&self) -> Option<&AttemptError> {
        match self {
            ProviderError::UpstreamUnavailable { source, .. } => Some(source),
            ProviderError::NoEndpointsConfigured { .. } => None,
        }
    }
}
