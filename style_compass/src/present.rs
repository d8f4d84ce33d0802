//! HTML rendering of a [`DashboardState`].
//!
//! The presenter reads the merged table and the snapshot and nothing else;
//! there is no decision logic here beyond choosing what to display.

pub mod cards;
pub mod chart;
pub mod recommendation;

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;

use crate::{
    aggregate::Trend,
    pipeline::{DashboardState, RatioHistory, SeriesRole, UnavailableCause},
    present::{
        cards::{MetricCard, ratio_card, snapshot_cards},
        recommendation::{Recommendation, Tone},
    },
};

/// Static page settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub title: String,
    /// The value-side holding the advice is written for, e.g. `600026`.
    pub subject: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "CSI 300 Style Compass".to_string(),
            subject: "600026".to_string(),
        }
    }
}

pub const UNAVAILABLE_MESSAGE: &str = "Data connection failed. Please refresh to retry.";
pub const INSUFFICIENT_MESSAGE: &str = "Not enough history yet to place the ratio against its lifeline.";

const STYLE: &str = r#"
body { background-color: #000000; color: #FFFFFF; font-family: -apple-system, "Segoe UI", sans-serif; margin: 0 auto; max-width: 860px; padding: 12px; }
h1 { font-size: 24px; color: #FFD700; }
h3 { font-size: 18px; margin: 4px 0; }
hr { border: 0; border-top: 1px solid #333333; }
.cards { display: flex; gap: 12px; }
.card { flex: 1; }
.big { font-size: 20px; font-weight: bold; margin: 4px 0; }
.caption, .muted { color: #AAAAAA; font-size: 14px; }
.advice { border-radius: 6px; padding: 10px 14px; }
.advice.caution { background-color: #3D1114; color: #FF8A80; }
.advice.favourable { background-color: #0F2E1A; color: #8AE6A2; }
.notice { background-color: #3D2E00; color: #FFD54F; border-radius: 6px; padding: 10px 14px; }
.error { background-color: #3D1114; color: #FF8A80; border-radius: 6px; padding: 10px 14px; }
.chart { width: 100%; height: auto; }
button { background: #222222; color: #FFFFFF; border: 1px solid #555555; border-radius: 4px; padding: 6px 12px; }
"#;

/// Escapes text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Formats a fetch time on the exchange's clock.
pub fn format_fetched_at(at: DateTime<Utc>) -> String {
    at.with_timezone(&Shanghai)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// Fixed, user-facing explanation for an unavailable page.
pub fn cause_message(cause: UnavailableCause) -> &'static str {
    match cause {
        UnavailableCause::Upstream {
            role: SeriesRole::Growth,
        } => "The growth index history could not be fetched.",
        UnavailableCause::Upstream {
            role: SeriesRole::Value,
        } => "The value index history could not be fetched.",
        UnavailableCause::JoinEmpty => "The growth and value histories share no trading days.",
    }
}

fn write_card(out: &mut String, card: &MetricCard) {
    out.push_str(&format!(
        r#"<div class="card"><h3>{}</h3><p class="big" style="color:{}">{}</p><p class="caption">{}</p></div>"#,
        escape(card.title),
        card.accent,
        escape(&card.value),
        escape(card.caption),
    ));
}

fn write_recommendation(out: &mut String, subject: &str, rec: &Recommendation) {
    let class = match rec.tone {
        Tone::Caution => "caution",
        Tone::Favourable => "favourable",
    };
    out.push_str(&format!(
        r#"<h2>🚢 {} trading notes</h2><div class="advice {class}"><p><strong>{}</strong></p><p>{}</p><p>👉 <strong>Strategy:</strong> {}</p></div>"#,
        escape(subject),
        escape(rec.headline),
        escape(rec.rationale),
        escape(rec.strategy),
    ));
}

fn write_footer(out: &mut String, history: &RatioHistory) {
    let rows = history.table.rows();
    let through = rows
        .last()
        .map(|r| r.date.to_string())
        .unwrap_or_default();
    out.push_str(&format!(
        r#"<p class="muted">{} trading days through {}. Fetched {}.</p>"#,
        rows.len(),
        escape(&through),
        escape(&format_fetched_at(history.fetched_at)),
    ));
}

fn write_body(out: &mut String, state: &DashboardState, options: &PageOptions) {
    match state {
        DashboardState::Unavailable { cause } => {
            out.push_str(&format!(
                r#"<div class="error"><p><strong>{}</strong></p><p class="muted">{}</p></div>"#,
                escape(UNAVAILABLE_MESSAGE),
                escape(cause_message(*cause)),
            ));
        }
        DashboardState::InsufficientHistory {
            history,
            available,
            required,
            delta,
        } => {
            out.push_str(&format!(
                r#"<div class="notice"><p><strong>{}</strong></p><p>{available} of {required} trading days available.</p></div><hr>"#,
                escape(INSUFFICIENT_MESSAGE),
            ));
            if let Some(latest) = history.table.latest() {
                out.push_str(r#"<div class="cards">"#);
                write_card(out, &ratio_card(latest.ratio, delta.map(Trend::from_delta)));
                out.push_str("</div><hr>");
            }
            out.push_str(&chart::render_svg(history.table.rows()));
            write_footer(out, history);
        }
        DashboardState::Ready { history, snapshot } => {
            out.push_str(r#"<div class="cards">"#);
            for card in snapshot_cards(snapshot) {
                write_card(out, &card);
            }
            out.push_str("</div><hr>");
            write_recommendation(
                out,
                &options.subject,
                Recommendation::for_regime(snapshot.regime),
            );
            out.push_str("<hr>");
            out.push_str(&chart::render_svg(history.table.rows()));
            write_footer(out, history);
        }
    }
}

/// Renders the complete, self-contained page.
pub fn render_page(state: &DashboardState, options: &PageOptions) -> String {
    let title = escape(&options.title);
    let mut out = String::with_capacity(16 * 1024);
    out.push_str(&format!(
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            "<title>{title}</title><style>{style}</style></head><body>",
            "<h1>🧭 {title}</h1>",
            "<form method=\"post\" action=\"/refresh\"><button type=\"submit\">⟳ Refresh</button></form><hr>",
        ),
        title = title,
        style = STYLE,
    ));
    write_body(&mut out, state, options);
    out.push_str("</body></html>");
    out
}
