use super::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of a message posted to the notification sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle(pub i64);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which attempt of a signal is currently in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetryStep {
    /// First attempt, right after the entry message
    Entry,
    /// The single retry (gale) after a first mismatch
    Gale,
}

impl RetryStep {
    pub fn count(&self) -> u8 {
        match self {
            RetryStep::Entry => 0,
            RetryStep::Gale => 1,
        }
    }
}

/// Signal lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    /// No signal in play
    Idle,
    /// Entry posted, waiting for the next round
    Pending,
    /// First attempt missed, waiting for the retry round
    Retry,
}

impl SignalPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalPhase::Idle => "IDLE",
            SignalPhase::Pending => "PENDING",
            SignalPhase::Retry => "RETRY",
        }
    }

    /// Check if this phase can transition to another phase
    pub fn can_transition_to(&self, target: SignalPhase) -> bool {
        use SignalPhase::*;

        match (self, target) {
            // Signal emitted
            (Idle, Pending) => true,

            // First mismatch
            (Pending, Retry) => true,

            // Win, push or loss
            (Pending, Idle) => true,
            (Retry, Idle) => true,

            _ => false,
        }
    }

    /// Get valid next phases from the current phase
    pub fn valid_transitions(&self) -> Vec<SignalPhase> {
        use SignalPhase::*;

        match self {
            Idle => vec![Pending],
            Pending => vec![Retry, Idle],
            Retry => vec![Idle],
        }
    }
}

impl fmt::Display for SignalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SignalPhase {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "IDLE" => Ok(SignalPhase::Idle),
            "PENDING" => Ok(SignalPhase::Pending),
            "RETRY" => Ok(SignalPhase::Retry),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// The signal currently waiting for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignal {
    /// Monotonic emission counter, used to attach late message handles
    pub seq: u64,
    /// Color that was signalled
    pub color: Outcome,
    pub pattern_id: u32,
    /// Copy of the trailing history that triggered the signal
    pub matched_sequence: Vec<Outcome>,
    pub retry: RetryStep,
    /// Round that was the newest when the signal went out
    pub emitted_round_id: String,
    pub emitted_at: DateTime<Utc>,
    pub entry_handle: Option<MessageHandle>,
    /// Retry notices, deleted once the signal resolves
    pub retry_handles: Vec<MessageHandle>,
}

impl PendingSignal {
    pub fn phase(&self) -> SignalPhase {
        match self.retry {
            RetryStep::Entry => SignalPhase::Pending,
            RetryStep::Gale => SignalPhase::Retry,
        }
    }
}

/// Singleton signal slot: either nothing is in play or exactly one signal is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignalState {
    #[default]
    Idle,
    Pending(PendingSignal),
}

impl SignalState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SignalState::Idle)
    }

    pub fn pending(&self) -> Option<&PendingSignal> {
        match self {
            SignalState::Idle => None,
            SignalState::Pending(signal) => Some(signal),
        }
    }

    pub fn pending_mut(&mut self) -> Option<&mut PendingSignal> {
        match self {
            SignalState::Idle => None,
            SignalState::Pending(signal) => Some(signal),
        }
    }

    pub fn phase(&self) -> SignalPhase {
        self.pending()
            .map(PendingSignal::phase)
            .unwrap_or(SignalPhase::Idle)
    }

    /// Take the pending signal out, leaving the slot idle
    pub fn take(&mut self) -> Option<PendingSignal> {
        match std::mem::take(self) {
            SignalState::Idle => None,
            SignalState::Pending(signal) => Some(signal),
        }
    }
}

/// Final result of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Round matched the signalled color
    Win,
    /// Round was a tie, counted as a win-equivalent
    Push,
    /// Both attempts missed
    Loss,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Win => "WIN",
            Resolution::Push => "PUSH",
            Resolution::Loss => "LOSS",
        }
    }

    /// Does this resolution extend the streak?
    pub fn is_win_equivalent(&self) -> bool {
        matches!(self, Resolution::Win | Resolution::Push)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phase transition event (for logging/debugging)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SignalPhase,
    pub to: SignalPhase,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: SignalPhase, to: SignalPhase, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.from.can_transition_to(self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use SignalPhase::*;

        assert!(Idle.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Retry));
        assert!(Pending.can_transition_to(Idle));
        assert!(Retry.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Retry));
        assert!(!Retry.can_transition_to(Pending));
        assert!(!Idle.can_transition_to(Idle));
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!(SignalPhase::try_from("idle").unwrap(), SignalPhase::Idle);
        assert_eq!(SignalPhase::try_from("RETRY").unwrap(), SignalPhase::Retry);
        assert!(SignalPhase::try_from("GALE2").is_err());
    }

    #[test]
    fn test_take_leaves_idle() {
        let mut state = SignalState::Pending(PendingSignal {
            seq: 1,
            color: Outcome::Player,
            pattern_id: 10,
            matched_sequence: vec![Outcome::Player, Outcome::Banker],
            retry: RetryStep::Gale,
            emitted_round_id: "r1".into(),
            emitted_at: Utc::now(),
            entry_handle: None,
            retry_handles: vec![],
        });
        assert_eq!(state.phase(), SignalPhase::Retry);

        let taken = state.take().unwrap();
        assert_eq!(taken.pattern_id, 10);
        assert!(state.is_idle());
        assert!(state.take().is_none());
    }

    #[test]
    fn test_resolution_win_equivalence() {
        assert!(Resolution::Win.is_win_equivalent());
        assert!(Resolution::Push.is_win_equivalent());
        assert!(!Resolution::Loss.is_win_equivalent());
    }
}
