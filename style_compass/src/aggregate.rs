//! Growth/value ratio, its 20-period moving average, and the regime signal.
//!
//! This is the entire decision logic of the dashboard: join the two index
//! histories on date, divide growth by value, smooth with a trailing mean and
//! compare the latest ratio with that mean.

use std::fmt;

use chrono::NaiveDate;
use index_ingestor::models::series_table::SeriesTable;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Window of the moving average used as the regime threshold ("lifeline").
pub const MA_WINDOW: usize = 20;

/// Rows needed to compute a day-over-day delta.
pub const DELTA_MIN_ROWS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// Not enough merged history for the requested figure.
    #[error("insufficient history: {available} merged row(s), {required} required")]
    InsufficientData { available: usize, required: usize },
}

/// One date present in both series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub close_growth: f64,
    pub close_value: f64,
    /// `close_growth / close_value`.
    pub ratio: f64,
    /// Mean of the trailing [`MA_WINDOW`] ratios including this row; `None`
    /// until that many rows exist.
    pub moving_average_20: Option<f64>,
}

/// Merged rows, ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct MergedTable {
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&MergedRow> {
        self.rows.last()
    }
}

/// Inner-joins two histories on date and derives ratio and MA20 per row.
///
/// Dates present in only one series are dropped. A row whose value close is
/// zero (or whose ratio is otherwise not finite) is dropped and logged; the
/// moving average then runs over the surviving rows.
pub fn merge(growth: &SeriesTable, value: &SeriesTable) -> MergedTable {
    let g = growth.points();
    let v = value.points();
    let mut rows = Vec::with_capacity(g.len().min(v.len()));

    // Both tables are sorted by date with unique dates.
    let (mut i, mut j) = (0, 0);
    while i < g.len() && j < v.len() {
        match g[i].date.cmp(&v[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let (date, close_growth, close_value) = (g[i].date, g[i].close, v[j].close);
                i += 1;
                j += 1;

                let ratio = close_growth / close_value;
                if close_value == 0.0 || !ratio.is_finite() {
                    warn!(%date, close_growth, close_value, "dropping row with undefined ratio");
                    continue;
                }
                rows.push(MergedRow {
                    date,
                    close_growth,
                    close_value,
                    ratio,
                    moving_average_20: None,
                });
            }
        }
    }

    let ratios: Vec<f64> = rows.iter().map(|r| r.ratio).collect();
    for (row, ma) in rows.iter_mut().zip(rolling_mean(&ratios, MA_WINDOW)) {
        row.moving_average_20 = ma;
    }

    MergedTable { rows }
}

/// Trailing simple mean over `window` values, inclusive of the current one.
///
/// Positions with fewer than `window` values available are `None`. Each full
/// window is summed afresh so equal inputs always produce equal outputs.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                let slice = &values[i + 1 - window..=i];
                slice.iter().sum::<f64>() / window as f64
            })
        })
        .collect()
}

/// Growth outperforming (ratio above its lifeline) or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Attack,
    Defense,
}

impl Regime {
    /// `Attack` iff `ratio > moving_average`; equality is `Defense`.
    pub fn classify(ratio: f64, moving_average: f64) -> Self {
        if ratio > moving_average {
            Regime::Attack
        } else {
            Regime::Defense
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Attack => f.write_str("ATTACK"),
            Regime::Defense => f.write_str("DEFENSE"),
        }
    }
}

/// Direction of the ratio versus the previous row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    /// `Rising` iff `delta > 0`.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 { Trend::Rising } else { Trend::Falling }
    }
}

/// Derived view of the latest rows. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub latest_ratio: f64,
    pub previous_ratio: f64,
    pub delta: f64,
    pub moving_average_20_latest: f64,
    pub regime: Regime,
    pub trend: Trend,
}

/// Latest ratio minus the previous one.
pub fn latest_delta(table: &MergedTable) -> Result<f64, AggregateError> {
    match table.rows() {
        [.., previous, latest] => Ok(latest.ratio - previous.ratio),
        rows => Err(AggregateError::InsufficientData {
            available: rows.len(),
            required: DELTA_MIN_ROWS,
        }),
    }
}

/// Builds the [`Snapshot`] from the last two rows.
///
/// Fails with [`AggregateError::InsufficientData`] when the latest row has no
/// moving average yet, i.e. with fewer than [`MA_WINDOW`] rows; no regime is
/// ever guessed.
pub fn derive_snapshot(table: &MergedTable) -> Result<Snapshot, AggregateError> {
    let insufficient = || AggregateError::InsufficientData {
        available: table.len(),
        required: MA_WINDOW,
    };

    let [.., previous, latest] = table.rows() else {
        return Err(insufficient());
    };
    let ma = latest.moving_average_20.ok_or_else(insufficient)?;
    let delta = latest.ratio - previous.ratio;

    Ok(Snapshot {
        date: latest.date,
        latest_ratio: latest.ratio,
        previous_ratio: previous.ratio,
        delta,
        moving_average_20_latest: ma,
        regime: Regime::classify(latest.ratio, ma),
        trend: Trend::from_delta(delta),
    })
}
