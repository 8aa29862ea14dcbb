use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical result of a single round.
///
/// `Player` is the first side, `Banker` the second side and `Tie` the push.
/// Feed labels and display glyphs are converted to this type once, at the
/// boundary, and never compared as text afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[serde(alias = "🔵")]
    Player,
    #[serde(alias = "🔴")]
    Banker,
    #[serde(alias = "🟡")]
    Tie,
}

/// Exact labels take precedence over the keyword heuristics.
const EXACT_LABELS: &[(&str, Outcome)] = &[
    ("PlayerWon", Outcome::Player),
    ("BankerWon", Outcome::Banker),
    ("Tie", Outcome::Tie),
    ("🔵", Outcome::Player),
    ("🔴", Outcome::Banker),
    ("🟡", Outcome::Tie),
];

const TIE_KEYWORDS: &[&str] = &["tie", "empate", "draw"];

impl Outcome {
    /// Map a raw feed label to an outcome.
    ///
    /// Returns `None` for labels no rule recognizes; the caller drops the
    /// round and reports it.
    pub fn normalize(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some((_, outcome)) = EXACT_LABELS.iter().find(|(label, _)| *label == raw) {
            return Some(*outcome);
        }

        let lower = raw.to_lowercase();
        if lower.contains("player") {
            Some(Outcome::Player)
        } else if lower.contains("banker") {
            Some(Outcome::Banker)
        } else if TIE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            Some(Outcome::Tie)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Player => "player",
            Outcome::Banker => "banker",
            Outcome::Tie => "tie",
        }
    }

    /// Glyph used in channel messages
    pub fn emoji(&self) -> &'static str {
        match self {
            Outcome::Player => "🔵",
            Outcome::Banker => "🔴",
            Outcome::Tie => "🟡",
        }
    }

    /// Is this the push outcome?
    pub fn is_push(&self) -> bool {
        matches!(self, Outcome::Tie)
    }

    /// Can a signal be issued for this outcome? Only the two sides can.
    pub fn is_side(&self) -> bool {
        !self.is_push()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.emoji())
    }
}

/// Render a sequence of outcomes as glyphs, e.g. `🔵🔴`.
pub fn format_sequence(outcomes: &[Outcome]) -> String {
    outcomes.iter().map(Outcome::emoji).collect()
}
