//! Inline SVG line chart of the ratio and its lifeline.

use crate::{
    aggregate::MergedRow,
    present::{
        cards::{LIFELINE_COLOUR, RATIO_COLOUR},
        escape,
    },
};

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 350.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 10.0;
const PAD_TOP: f64 = 34.0;
const PAD_BOTTOM: f64 = 28.0;

/// Maps row index and value into the plot area.
struct Scale {
    n: usize,
    min: f64,
    max: f64,
}

impl Scale {
    fn new(rows: &[MergedRow]) -> Option<Self> {
        let values = rows
            .iter()
            .flat_map(|r| std::iter::once(r.ratio).chain(r.moving_average_20));
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        // Flat series still get a visible band.
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 0.01, max + 0.01)
        } else {
            (min, max)
        };
        Some(Self {
            n: rows.len(),
            min,
            max,
        })
    }

    fn x(&self, i: usize) -> f64 {
        let span = WIDTH - PAD_LEFT - PAD_RIGHT;
        if self.n <= 1 {
            PAD_LEFT + span / 2.0
        } else {
            PAD_LEFT + span * i as f64 / (self.n - 1) as f64
        }
    }

    fn y(&self, v: f64) -> f64 {
        let span = HEIGHT - PAD_TOP - PAD_BOTTOM;
        PAD_TOP + span * (self.max - v) / (self.max - self.min)
    }
}

fn polyline<I>(scale: &Scale, points: I) -> String
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut out = String::new();
    for (i, v) in points {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{:.1},{:.1}", scale.x(i), scale.y(v)));
    }
    out
}

/// Renders the chart, or a placeholder when there is nothing to plot.
pub fn render_svg(rows: &[MergedRow]) -> String {
    let Some(scale) = Scale::new(rows) else {
        return r#"<p class="muted">No data to chart.</p>"#.to_string();
    };

    let ratio = polyline(&scale, rows.iter().enumerate().map(|(i, r)| (i, r.ratio)));
    let lifeline = polyline(
        &scale,
        rows.iter()
            .enumerate()
            .filter_map(|(i, r)| r.moving_average_20.map(|ma| (i, ma))),
    );

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="Ratio and 20-day lifeline">"#
    ));
    svg.push_str(&format!(
        r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="black"/>"#
    ));

    // Legend, horizontal above the plot.
    svg.push_str(&format!(
        concat!(
            r#"<line x1="{x0}" y1="14" x2="{x1}" y2="14" stroke="{rc}" stroke-width="2"/>"#,
            r#"<text x="{tx0}" y="18" fill="white" font-size="12">Ratio</text>"#,
            r#"<line x1="{x2}" y1="14" x2="{x3}" y2="14" stroke="{lc}" stroke-width="1" stroke-dasharray="2,3"/>"#,
            r#"<text x="{tx1}" y="18" fill="white" font-size="12">MA20</text>"#,
        ),
        x0 = PAD_LEFT,
        x1 = PAD_LEFT + 20.0,
        tx0 = PAD_LEFT + 24.0,
        x2 = PAD_LEFT + 80.0,
        x3 = PAD_LEFT + 100.0,
        tx1 = PAD_LEFT + 104.0,
        rc = RATIO_COLOUR,
        lc = LIFELINE_COLOUR,
    ));

    // Y bounds.
    for v in [scale.max, scale.min] {
        svg.push_str(&format!(
            r#"<text x="4" y="{:.1}" fill="white" font-size="11">{v:.4}</text>"#,
            scale.y(v) + 4.0
        ));
    }

    // First and last date under the plot.
    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        svg.push_str(&format!(
            r#"<text x="{PAD_LEFT}" y="{:.1}" fill="white" font-size="11">{}</text>"#,
            HEIGHT - 8.0,
            escape(&first.date.to_string())
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" fill="white" font-size="11" text-anchor="end">{}</text>"#,
            WIDTH - PAD_RIGHT,
            HEIGHT - 8.0,
            escape(&last.date.to_string())
        ));
    }

    svg.push_str(&format!(
        r#"<polyline fill="none" stroke="{RATIO_COLOUR}" stroke-width="2" points="{ratio}"/>"#
    ));
    if !lifeline.is_empty() {
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{LIFELINE_COLOUR}" stroke-width="1" stroke-dasharray="2,3" points="{lifeline}"/>"#
        ));
    }
    svg.push_str("</svg>");
    svg
}
