//! Signal lifecycle state machine
//!
//! `Idle -> Pending -> Retry -> Idle`, where a win or push at either pending
//! step returns to `Idle` directly. The lifecycle never performs I/O: every
//! operation mutates state and returns a [`Dispatch`] describing which
//! messages to post or delete. The caller runs the dispatch and reports the
//! produced handles back through [`SignalLifecycle::record_post`].

use super::{Notice, PatternMatcher, RoundHistory, Scoreboard};
use crate::domain::{
    format_sequence, MessageHandle, Outcome, PendingSignal, Resolution, RetryStep, SignalPhase,
    SignalState, StateTransition,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

/// How the handle of a posted message must be remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    /// Fire and forget
    Untracked,
    /// Entry message of signal `seq`
    Entry { seq: u64 },
    /// Retry notice of signal `seq`, deleted when the signal resolves
    Retry { seq: u64 },
    /// The idle "analyzing" placeholder
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Post { notice: Notice, track: Track },
    Delete(MessageHandle),
}

/// Ordered list of sink calls produced by a state transition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub actions: Vec<Action>,
}

impl Dispatch {
    pub fn post(&mut self, notice: Notice, track: Track) {
        self.actions.push(Action::Post { notice, track });
    }

    pub fn delete<I: IntoIterator<Item = MessageHandle>>(&mut self, handles: I) {
        self.actions.extend(handles.into_iter().map(Action::Delete));
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Notices to post, in order
    pub fn notices(&self) -> Vec<&Notice> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::Post { notice, .. } => Some(notice),
                Action::Delete(_) => None,
            })
            .collect()
    }

    /// Handles to delete, in order
    pub fn deletions(&self) -> Vec<MessageHandle> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::Delete(handle) => Some(*handle),
                Action::Post { .. } => None,
            })
            .collect()
    }
}

/// Newest outcome compared to the signalled color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Hit,
    Push,
    Miss,
}

impl Verdict {
    pub fn judge(outcome: Outcome, color: Outcome) -> Self {
        if outcome.is_push() {
            Verdict::Push
        } else if outcome == color {
            Verdict::Hit
        } else {
            Verdict::Miss
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Resolved(Resolution),
    Retry,
}

/// Resolution transition table
pub fn transition(step: RetryStep, verdict: Verdict) -> Transition {
    match (step, verdict) {
        (_, Verdict::Push) => Transition::Resolved(Resolution::Push),
        (_, Verdict::Hit) => Transition::Resolved(Resolution::Win),
        (RetryStep::Entry, Verdict::Miss) => Transition::Retry,
        (RetryStep::Gale, Verdict::Miss) => Transition::Resolved(Resolution::Loss),
    }
}

/// Why `try_emit` did or did not produce a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitDecision {
    Emitted(Dispatch),
    /// A signal is already in play
    Busy,
    /// Resolved recently, waiting for a fresh round
    Cooldown,
    /// Not enough rounds yet
    WarmingUp { have: usize, need: usize },
    NoMatch,
    /// Same pattern against the same tail as the previous signal
    Duplicate { pattern_id: u32 },
}

/// What `try_resolve` did with the newest round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveDecision {
    /// No signal in play
    Idle,
    NoHistory,
    /// Newest round was already used for a resolution step
    AlreadyResolved,
    /// Newest round is the one the signal was emitted on
    AwaitingNextRound,
    /// First attempt missed
    Retry(Dispatch),
    Resolved {
        resolution: Resolution,
        dispatch: Dispatch,
    },
}

/// Identity of a signal for duplicate suppression
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignalKey {
    pattern_id: u32,
    sequence: Vec<Outcome>,
}

#[derive(Debug)]
pub struct SignalLifecycle {
    state: SignalState,
    cooldown: bool,
    min_history: usize,
    last_signal: Option<SignalKey>,
    last_resolved_round: Option<String>,
    next_seq: u64,
    /// Retry notices whose signal resolved before the handle came back
    stale_handles: Vec<MessageHandle>,
    placeholder: Option<MessageHandle>,
    placeholder_posted_at: Option<DateTime<Utc>>,
    placeholder_in_flight: bool,
}

impl SignalLifecycle {
    pub fn new(min_history: usize) -> Self {
        Self {
            state: SignalState::Idle,
            cooldown: false,
            min_history,
            last_signal: None,
            last_resolved_round: None,
            next_seq: 1,
            stale_handles: Vec::new(),
            placeholder: None,
            placeholder_posted_at: None,
            placeholder_in_flight: false,
        }
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    pub fn phase(&self) -> SignalPhase {
        self.state.phase()
    }

    pub fn pending(&self) -> Option<&PendingSignal> {
        self.state.pending()
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown
    }

    pub fn placeholder(&self) -> Option<MessageHandle> {
        self.placeholder
    }

    /// A genuinely new round arrived
    pub fn on_round_appended(&mut self) {
        if self.cooldown {
            debug!("Cooldown cleared by new round");
        }
        self.cooldown = false;
    }

    /// Try to open a new signal from the current history
    pub fn try_emit(&mut self, history: &RoundHistory, matcher: &PatternMatcher) -> EmitDecision {
        if !self.state.is_idle() {
            return EmitDecision::Busy;
        }
        if self.cooldown {
            return EmitDecision::Cooldown;
        }
        if history.len() < self.min_history {
            return EmitDecision::WarmingUp {
                have: history.len(),
                need: self.min_history,
            };
        }
        let Some(round_id) = history.latest_round_id() else {
            return EmitDecision::WarmingUp {
                have: 0,
                need: self.min_history.max(1),
            };
        };
        let Some(found) = matcher.find(history) else {
            return EmitDecision::NoMatch;
        };

        let key = SignalKey {
            pattern_id: found.pattern.id,
            sequence: found.matched,
        };
        if self.last_signal.as_ref() == Some(&key) {
            return EmitDecision::Duplicate {
                pattern_id: key.pattern_id,
            };
        }

        let mut dispatch = Dispatch::default();
        dispatch.delete(self.placeholder.take());
        dispatch.delete(self.stale_handles.drain(..));
        self.placeholder_posted_at = None;

        let seq = self.next_seq;
        self.next_seq += 1;
        let color = found.pattern.signal;

        self.log_transition(SignalPhase::Pending, "pattern matched");
        info!(
            "Signal #{} {} from pattern {} on {} (round {})",
            seq,
            color,
            key.pattern_id,
            format_sequence(&key.sequence),
            round_id
        );

        self.state = SignalState::Pending(PendingSignal {
            seq,
            color,
            pattern_id: key.pattern_id,
            matched_sequence: key.sequence.clone(),
            retry: RetryStep::Entry,
            emitted_round_id: round_id.to_string(),
            emitted_at: Utc::now(),
            entry_handle: None,
            retry_handles: Vec::new(),
        });
        self.last_signal = Some(key);

        dispatch.post(Notice::Entry { color }, Track::Entry { seq });
        EmitDecision::Emitted(dispatch)
    }

    /// Check the pending signal against the newest round
    pub fn try_resolve(
        &mut self,
        history: &RoundHistory,
        scoreboard: &mut Scoreboard,
    ) -> ResolveDecision {
        let Some(signal) = self.state.pending() else {
            return ResolveDecision::Idle;
        };
        let (Some(latest), Some(round_id)) = (history.latest(), history.latest_round_id()) else {
            return ResolveDecision::NoHistory;
        };
        if self.last_resolved_round.as_deref() == Some(round_id) {
            return ResolveDecision::AlreadyResolved;
        }
        if signal.emitted_round_id == round_id {
            debug!("Waiting for the round after {} to resolve", round_id);
            return ResolveDecision::AwaitingNextRound;
        }

        let step = signal.retry;
        let color = signal.color;
        self.last_resolved_round = Some(round_id.to_string());

        let mut dispatch = Dispatch::default();
        match transition(step, Verdict::judge(latest, color)) {
            Transition::Retry => {
                self.log_transition(SignalPhase::Retry, "first attempt missed");
                let Some(signal) = self.state.pending_mut() else {
                    return ResolveDecision::Idle;
                };
                signal.retry = RetryStep::Gale;
                info!(
                    "Signal #{} {} missed on {} (round {}), retrying",
                    signal.seq, color, latest, round_id
                );
                dispatch.post(Notice::Retry, Track::Retry { seq: signal.seq });
                ResolveDecision::Retry(dispatch)
            }
            Transition::Resolved(resolution) => {
                self.log_transition(SignalPhase::Idle, resolution.as_str());
                let Some(signal) = self.state.take() else {
                    return ResolveDecision::Idle;
                };
                scoreboard.record(resolution);
                info!(
                    "Signal #{} {} resolved {} on {} (round {}, streak {})",
                    signal.seq,
                    color,
                    resolution,
                    latest,
                    round_id,
                    scoreboard.streak()
                );

                if resolution.is_win_equivalent() {
                    dispatch.post(
                        Notice::Streak {
                            streak: scoreboard.streak(),
                        },
                        Track::Untracked,
                    );
                } else {
                    dispatch.post(Notice::Loss, Track::Untracked);
                }
                dispatch.post(Notice::Scoreboard(scoreboard.snapshot()), Track::Untracked);
                dispatch.delete(signal.retry_handles);

                self.cooldown = true;
                ResolveDecision::Resolved {
                    resolution,
                    dispatch,
                }
            }
        }
    }

    /// Is the idle placeholder old enough to be reposted?
    pub fn placeholder_due(&self, now: DateTime<Utc>, refresh_every: Duration) -> bool {
        if !self.state.is_idle() || self.placeholder.is_none() {
            return false;
        }
        self.placeholder_posted_at
            .map(|at| now - at >= refresh_every)
            .unwrap_or(true)
    }

    /// Replace the placeholder with a fresh one
    pub fn refresh_placeholder(&mut self, now: DateTime<Utc>) -> Option<Dispatch> {
        if !self.state.is_idle() || self.placeholder_in_flight {
            return None;
        }
        let mut dispatch = Dispatch::default();
        dispatch.delete(self.placeholder.take());
        dispatch.post(Notice::Analyzing, Track::Placeholder);
        self.placeholder_in_flight = true;
        self.placeholder_posted_at = Some(now);
        Some(dispatch)
    }

    /// Post a placeholder if idle and none is shown
    pub fn ensure_placeholder(&mut self, now: DateTime<Utc>) -> Option<Dispatch> {
        if self.placeholder.is_some() {
            return None;
        }
        self.refresh_placeholder(now)
    }

    /// Record the handle produced by a posted message.
    ///
    /// Returns a handle that is no longer wanted and should be deleted.
    pub fn record_post(
        &mut self,
        track: Track,
        handle: Option<MessageHandle>,
    ) -> Option<MessageHandle> {
        match track {
            Track::Untracked => None,
            Track::Entry { seq } => {
                let handle = handle?;
                match self.state.pending_mut() {
                    Some(signal) if signal.seq == seq => {
                        signal.entry_handle = Some(handle);
                    }
                    _ => debug!("Entry handle {} for finished signal #{}", handle, seq),
                }
                None
            }
            Track::Retry { seq } => {
                let handle = handle?;
                match self.state.pending_mut() {
                    Some(signal) if signal.seq == seq => signal.retry_handles.push(handle),
                    _ => {
                        debug!("Retry handle {} outlived signal #{}", handle, seq);
                        self.stale_handles.push(handle);
                    }
                }
                None
            }
            Track::Placeholder => {
                self.placeholder_in_flight = false;
                let handle = handle?;
                if !self.state.is_idle() {
                    // A signal went out while the placeholder was in flight
                    return Some(handle);
                }
                if let Some(old) = self.placeholder.replace(handle) {
                    warn!("Placeholder {} replaced without deletion", old);
                    self.stale_handles.push(old);
                }
                info!("Placeholder posted: {}", handle);
                None
            }
        }
    }

    fn log_transition(&self, to: SignalPhase, reason: &str) {
        let transition = StateTransition::new(self.phase(), to, reason);
        if !transition.is_valid() {
            warn!(
                "Unexpected phase transition {} -> {} ({})",
                transition.from, transition.to, transition.reason
            );
        }
        debug!(?transition, "Signal phase transition");
    }
}
