use crate::domain::Outcome;
use std::collections::VecDeque;
use tracing::debug;

/// Result of observing a polled round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// New round, outcome appended
    Appended,
    /// Same identifier as the last appended round, nothing changed
    Duplicate,
}

/// Bounded, oldest-first history of round outcomes
///
/// De-duplication only compares against the last appended identifier.
/// Replayed or out-of-order identifiers are appended as new rounds.
#[derive(Debug, Clone)]
pub struct RoundHistory {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    last_round_id: Option<String>,
}

impl RoundHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            last_round_id: None,
        }
    }

    /// Record a polled round
    pub fn observe(&mut self, round_id: &str, outcome: Outcome) -> Observation {
        if self.last_round_id.as_deref() == Some(round_id) {
            debug!("Round {} unchanged", round_id);
            return Observation::Duplicate;
        }

        self.last_round_id = Some(round_id.to_string());
        self.outcomes.push_back(outcome);

        // Evict oldest entries
        while self.outcomes.len() > self.capacity {
            self.outcomes.pop_front();
        }

        Observation::Appended
    }

    /// Most recent outcome
    pub fn latest(&self) -> Option<Outcome> {
        self.outcomes.back().copied()
    }

    /// Identifier of the most recently appended round
    pub fn latest_round_id(&self) -> Option<&str> {
        self.last_round_id.as_deref()
    }

    /// Last `n` outcomes, oldest first; empty if fewer than `n` exist
    pub fn tail(&self, n: usize) -> Vec<Outcome> {
        if n > self.outcomes.len() {
            return Vec::new();
        }
        self.outcomes.iter().skip(self.outcomes.len() - n).copied().collect()
    }

    /// Does the history end with exactly `sequence`?
    pub fn ends_with(&self, sequence: &[Outcome]) -> bool {
        let n = sequence.len();
        if n == 0 || n > self.outcomes.len() {
            return false;
        }
        self.outcomes
            .iter()
            .skip(self.outcomes.len() - n)
            .eq(sequence.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::*;

    #[test]
    fn test_append_and_duplicate() {
        let mut history = RoundHistory::new(10);

        assert_eq!(history.observe("r1", Player), Observation::Appended);
        assert_eq!(history.observe("r1", Banker), Observation::Duplicate);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(Player));
        assert_eq!(history.latest_round_id(), Some("r1"));
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let mut history = RoundHistory::new(3);
        let outcomes = [Player, Banker, Tie, Banker, Player];

        for (i, outcome) in outcomes.iter().enumerate() {
            history.observe(&format!("r{i}"), *outcome);
            assert!(history.len() <= 3);
        }

        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![Tie, Banker, Player]);
    }

    #[test]
    fn test_replayed_identifier_is_appended() {
        // Only the last identifier is compared
        let mut history = RoundHistory::new(10);
        history.observe("r1", Player);
        history.observe("r2", Banker);
        assert_eq!(history.observe("r1", Player), Observation::Appended);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_tail() {
        let mut history = RoundHistory::new(10);
        assert!(history.tail(1).is_empty());

        history.observe("r1", Player);
        history.observe("r2", Banker);
        history.observe("r3", Tie);

        assert_eq!(history.tail(2), vec![Banker, Tie]);
        assert_eq!(history.tail(3), vec![Player, Banker, Tie]);
        assert!(history.tail(4).is_empty());
        assert!(history.tail(0).is_empty());
    }

    #[test]
    fn test_ends_with() {
        let mut history = RoundHistory::new(10);
        history.observe("r1", Banker);
        history.observe("r2", Player);
        history.observe("r3", Banker);

        assert!(history.ends_with(&[Player, Banker]));
        assert!(!history.ends_with(&[Banker, Player]));
        assert!(!history.ends_with(&[]));
        assert!(!history.ends_with(&[Tie, Banker, Player, Banker]));
    }
}
