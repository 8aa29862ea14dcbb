use super::Outcome;
use serde::{Deserialize, Serialize};

/// Latest round as reported by the feed, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Opaque round identifier; the feed guarantees uniqueness
    pub round_id: String,
    /// Raw outcome label, e.g. "PlayerWon"
    pub outcome_label: String,
}

impl RoundResult {
    pub fn new(round_id: impl Into<String>, outcome_label: impl Into<String>) -> Self {
        Self {
            round_id: round_id.into(),
            outcome_label: outcome_label.into(),
        }
    }

    /// Normalize the raw label. `None` means the round must be dropped.
    pub fn normalize(&self) -> Option<Round> {
        Outcome::normalize(&self.outcome_label).map(|outcome| Round {
            round_id: self.round_id.clone(),
            outcome,
        })
    }
}

/// A normalized round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub round_id: String,
    pub outcome: Outcome,
}
