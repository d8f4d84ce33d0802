//! A single parsed closing price.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day's closing price for an index.
///
/// Only constructed through [`PricePoint::new`], which guarantees the close
/// is a finite positive number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date (exchange local calendar).
    pub date: NaiveDate,

    /// Closing price.
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Option<Self> {
        (close.is_finite() && close > 0.0).then_some(Self { date, close })
    }
}
