use super::{format_sequence, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A configured trailing sequence that triggers a signal of a given color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Unique pattern id
    pub id: u32,
    /// Outcomes the history must end with, oldest first
    pub sequence: Vec<Outcome>,
    /// Color to play when the sequence matches (never `tie`)
    pub signal: Outcome,
}

impl Pattern {
    pub fn new(id: u32, sequence: Vec<Outcome>, signal: Outcome) -> Self {
        Self {
            id,
            sequence,
            signal,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Check a single pattern on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.sequence.is_empty() {
            return Err(format!("pattern {} has an empty sequence", self.id));
        }
        if !self.signal.is_side() {
            return Err(format!(
                "pattern {} signals {}, only player or banker can be signalled",
                self.id,
                self.signal.as_str()
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> {}",
            self.id,
            format_sequence(&self.sequence),
            self.signal
        )
    }
}

/// Validate an ordered pattern list, collecting every problem
pub fn validate_patterns(patterns: &[Pattern]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if patterns.is_empty() {
        errors.push("at least one pattern must be configured".to_string());
    }

    for pattern in patterns {
        if let Err(e) = pattern.validate() {
            errors.push(e);
        }
        if !seen.insert(pattern.id) {
            errors.push(format!("duplicate pattern id {}", pattern.id));
        }
    }

    errors
}

/// Pattern list used when the configuration supplies none
pub fn default_patterns() -> Vec<Pattern> {
    vec![Pattern::new(
        10,
        vec![Outcome::Player, Outcome::Banker],
        Outcome::Player,
    )]
}
