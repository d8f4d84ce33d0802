//! View models for the two metric cards.

use serde::Serialize;

use crate::aggregate::{Regime, Snapshot, Trend};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    /// Formatted to four decimals.
    pub value: String,
    pub caption: &'static str,
    /// CSS colour of the value.
    pub accent: &'static str,
}

pub const RATIO_COLOUR: &str = "#00E5FF";
pub const LIFELINE_COLOUR: &str = "#FFFF00";

pub fn trend_caption(trend: Trend) -> &'static str {
    match trend {
        Trend::Rising => "📈 vs. yesterday: up",
        Trend::Falling => "📉 vs. yesterday: down",
    }
}

pub fn regime_caption(regime: Regime) -> &'static str {
    match regime {
        Regime::Attack => "🔥 Attack zone",
        Regime::Defense => "🛡️ Defense zone",
    }
}

/// Current ratio with its day-over-day direction, if known.
pub fn ratio_card(ratio: f64, trend: Option<Trend>) -> MetricCard {
    MetricCard {
        title: "Current ratio",
        value: format!("{ratio:.4}"),
        caption: trend.map(trend_caption).unwrap_or("Not enough history for a trend"),
        accent: RATIO_COLOUR,
    }
}

pub fn lifeline_card(moving_average: f64, regime: Regime) -> MetricCard {
    MetricCard {
        title: "20-day lifeline",
        value: format!("{moving_average:.4}"),
        caption: regime_caption(regime),
        accent: LIFELINE_COLOUR,
    }
}

pub fn snapshot_cards(snapshot: &Snapshot) -> [MetricCard; 2] {
    [
        ratio_card(snapshot.latest_ratio, Some(snapshot.trend)),
        lifeline_card(snapshot.moving_average_20_latest, snapshot.regime),
    ]
}
