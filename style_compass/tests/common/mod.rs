#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use index_ingestor::{
    models::{
        index_id::IndexId, price_point::PricePoint, request_params::SeriesRequest,
        series_table::SeriesTable,
    },
    providers::{DataProvider, ProviderError},
};
use style_compass::pipeline::Pipeline;

pub fn growth_id() -> IndexId {
    IndexId::new(1, "000918")
}

pub fn value_id() -> IndexId {
    IndexId::new(1, "000919")
}

pub fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
}

/// Consecutive days starting 2024-01-01.
pub fn series(closes: &[f64]) -> Vec<(NaiveDate, f64)> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| (day(i as u64), c))
        .collect()
}

/// Serves frozen histories per index; an index with no entry fails.
#[derive(Default)]
pub struct FrozenProvider {
    series: Mutex<HashMap<IndexId, Vec<(NaiveDate, f64)>>>,
    calls: AtomicUsize,
}

impl FrozenProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, index: IndexId, points: Vec<(NaiveDate, f64)>) {
        self.series.lock().unwrap().insert(index, points);
    }

    pub fn remove(&self, index: &IndexId) {
        self.series.lock().unwrap().remove(index);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for FrozenProvider {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<SeriesTable, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let points = self.series.lock().unwrap().get(&request.index).cloned();
        match points {
            Some(points) => Ok(SeriesTable::new(
                request.index.clone(),
                points
                    .into_iter()
                    .filter_map(|(date, close)| PricePoint::new(date, close)),
            )),
            None => Err(ProviderError::NoEndpointsConfigured {
                index: request.index.clone(),
            }),
        }
    }
}

pub fn pipeline(provider: Arc<FrozenProvider>) -> Pipeline {
    pipeline_with_ttl(provider, Duration::from_secs(600))
}

pub fn pipeline_with_ttl(provider: Arc<dyn DataProvider>, ttl: Duration) -> Pipeline {
    Pipeline::new(
        provider,
        SeriesRequest::daily(growth_id()),
        SeriesRequest::daily(value_id()),
        ttl,
    )
}

/// Provider loaded with `n` aligned days where growth closes at `ratios[i]`
/// and value stays at 1.0.
pub fn provider_with_ratios(ratios: &[f64]) -> Arc<FrozenProvider> {
    let provider = FrozenProvider::new();
    provider.set(growth_id(), series(ratios));
    provider.set(value_id(), series(&vec![1.0; ratios.len()]));
    provider
}
