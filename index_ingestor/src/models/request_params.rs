use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::index_id::IndexId;

/// Format of the date tokens used by the upstream, e.g. `20240101`.
pub const DATE_TOKEN_FORMAT: &str = "%Y%m%d";

/// Bar granularity of the requested history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// The upstream's `klt` code for this period.
    pub fn code(self) -> u16 {
        match self {
            Period::Daily => 101,
            Period::Weekly => 102,
            Period::Monthly => 103,
        }
    }
}

/// Price adjustment mode for corporate actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    None,
    #[default]
    Forward,
    Backward,
}

impl Adjustment {
    /// The upstream's `fqt` code for this mode.
    pub fn code(self) -> u8 {
        match self {
            Adjustment::None => 0,
            Adjustment::Forward => 1,
            Adjustment::Backward => 2,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid date token '{0}': expected YYYYMMDD")]
    Token(String),

    #[error("Date range start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Inclusive calendar range of the requested history.
///
/// An end far in the future (the default `20991231`) means "through the
/// latest available bar".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYYMMDD` tokens.
    pub fn from_tokens(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date_token(start)?, parse_date_token(end)?)
    }

    pub fn start_token(&self) -> String {
        self.start.format(DATE_TOKEN_FORMAT).to_string()
    }

    pub fn end_token(&self) -> String {
        self.end.format(DATE_TOKEN_FORMAT).to_string()
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_token(), self.end_token())
    }
}

pub fn parse_date_token(token: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(token.trim(), DATE_TOKEN_FORMAT)
        .map_err(|_| DateRangeError::Token(token.to_string()))
}

impl FromStr for DateRange {
    type Err = DateRangeError;

    /// Parses `"<start>..<end>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| DateRangeError::Token(s.to_string()))?;
        Self::from_tokens(start, end)
    }
}

/// Vendor-agnostic parameters for one quote-history request.
///
/// This is the standard input for every
/// [`DataProvider`](crate::providers::DataProvider) implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesRequest {
    /// The index to request, e.g. `1.000918`.
    pub index: IndexId,

    /// Bar granularity. Providers reject periods they can't serve.
    pub period: Period,

    /// Corporate-action adjustment mode.
    pub adjustment: Adjustment,

    /// Requested calendar range, inclusive on both ends.
    pub range: DateRange,
}

impl SeriesRequest {
    /// A daily, forward-adjusted request over the default range.
    pub fn daily(index: IndexId) -> Self {
        Self {
            index,
            period: Period::Daily,
            adjustment: Adjustment::default(),
            range: DateRange::default(),
        }
    }
}
