//! Trailing-sequence pattern matcher
//!
//! Patterns are scanned in configured order and the first one whose sequence
//! equals the end of the history wins. List order decides ties, not length.

use super::RoundHistory;
use crate::domain::{Outcome, Pattern};

/// A pattern that matched, plus the literal history tail it matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    pub pattern: &'a Pattern,
    pub matched: Vec<Outcome>,
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Pattern>,
}

impl PatternMatcher {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// First pattern in list order whose sequence ends the history
    pub fn find(&self, history: &RoundHistory) -> Option<PatternMatch<'_>> {
        self.patterns
            .iter()
            .find(|pattern| history.ends_with(&pattern.sequence))
            .map(|pattern| PatternMatch {
                pattern,
                matched: history.tail(pattern.len()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::*;

    fn history_of(outcomes: &[Outcome]) -> RoundHistory {
        let mut history = RoundHistory::new(50);
        for (i, outcome) in outcomes.iter().enumerate() {
            history.observe(&format!("r{i}"), *outcome);
        }
        history
    }

    #[test]
    fn test_matches_trailing_sequence() {
        let matcher = PatternMatcher::new(vec![Pattern::new(1, vec![Player, Banker], Player)]);

        let found = matcher.find(&history_of(&[Tie, Player, Banker])).unwrap();
        assert_eq!(found.pattern.id, 1);
        assert_eq!(found.matched, vec![Player, Banker]);

        assert!(matcher.find(&history_of(&[Tie, Banker, Player])).is_none());
    }

    #[test]
    fn test_no_match_on_short_history() {
        let matcher = PatternMatcher::new(vec![Pattern::new(1, vec![Player, Banker], Player)]);
        assert!(matcher.find(&history_of(&[Banker])).is_none());
        assert!(matcher.find(&history_of(&[])).is_none());
    }

    #[test]
    fn test_list_order_beats_length() {
        let matcher = PatternMatcher::new(vec![
            Pattern::new(1, vec![Banker], Player),
            Pattern::new(2, vec![Player, Player, Banker], Banker),
        ]);
        let found = matcher.find(&history_of(&[Player, Player, Banker])).unwrap();
        assert_eq!(found.pattern.id, 1);
        assert_eq!(found.matched, vec![Banker]);

        let matcher = PatternMatcher::new(vec![
            Pattern::new(2, vec![Player, Player, Banker], Banker),
            Pattern::new(1, vec![Banker], Player),
        ]);
        let found = matcher.find(&history_of(&[Player, Player, Banker])).unwrap();
        assert_eq!(found.pattern.id, 2);
    }

    #[test]
    fn test_sequence_not_multiset() {
        let matcher = PatternMatcher::new(vec![Pattern::new(3, vec![Player, Tie], Banker)]);
        assert!(matcher.find(&history_of(&[Tie, Player])).is_none());
        assert!(matcher.find(&history_of(&[Player, Tie])).is_some());
    }
}
