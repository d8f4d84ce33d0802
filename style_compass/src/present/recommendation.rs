//! The fixed advice shown for each regime.

use serde::Serialize;

use crate::aggregate::Regime;

/// How the advice box is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Conditions are against the value position.
    Caution,
    /// Conditions favour the value position.
    Favourable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub tone: Tone,
    pub headline: &'static str,
    pub rationale: &'static str,
    pub strategy: &'static str,
}

const ATTACK: Recommendation = Recommendation {
    tone: Tone::Caution,
    headline: "Headwind: growth is leading",
    rationale: "Money is crowding into technology and growth names while value stocks are left behind.",
    strategy: "Don't chase strength. Trim into rallies and trade the range.",
};

const DEFENSE: Recommendation = Recommendation {
    tone: Tone::Favourable,
    headline: "Tailwind: value is leading",
    rationale: "Money is rotating back into dividend and defensive names; value is the safe harbour.",
    strategy: "Buy the dips with conviction and hold the position.",
};

impl Recommendation {
    /// Static two-way lookup; there is no other input.
    pub fn for_regime(regime: Regime) -> &'static Recommendation {
        match regime {
            Regime::Attack => &ATTACK,
            Regime::Defense => &DEFENSE,
        }
    }
}
