//! Ordered closing-price history for one index.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::models::{index_id::IndexId, price_point::PricePoint};

/// Represents the complete closing-price history of a single index.
///
/// Points are held ascending by date and dates are unique within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    /// The index this data represents.
    pub index: IndexId,
    points: Vec<PricePoint>,
}

impl SeriesTable {
    /// Builds a table from points in any order.
    ///
    /// When a date appears more than once the first occurrence wins.
    pub fn new(index: IndexId, points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
        for point in points {
            if by_date.contains_key(&point.date) {
                warn!(index = %index, date = %point.date, "duplicate date in series; keeping first");
                continue;
            }
            by_date.insert(point.date, point);
        }
        Self {
            index,
            points: by_date.into_values().collect(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }
}
