//! Signal engine
//!
//! Owns the shared history, lifecycle and scoreboard behind a single lock.
//! Each tick takes the lock once to apply its state transition, releases it,
//! talks to the feed or sink, and re-takes it only to record produced
//! message handles.

use crate::adapters::{NotificationSink, OutcomeFeed};
use crate::config::AppConfig;
use crate::domain::{PendingSignal, Resolution, SignalPhase};
use crate::error::{Result, SignalError};
use crate::strategy::{
    Action, Dispatch, EmitDecision, Observation, PatternMatcher, ResolveDecision, RoundHistory,
    Scoreboard, ScoreboardSnapshot, SignalLifecycle, Track,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// State shared by the feed and signal loops
#[derive(Debug)]
struct EngineState {
    history: RoundHistory,
    lifecycle: SignalLifecycle,
    scoreboard: Scoreboard,
}

impl EngineState {
    fn roll_scoreboard(&mut self, now: DateTime<Utc>) -> bool {
        let today = self.scoreboard.local_date(now);
        self.scoreboard.maybe_reset_for_new_day(today)
    }
}

/// What a feed tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTick {
    /// Feed returned nothing
    Unavailable,
    /// Label could not be normalized; round dropped
    Unrecognized { round_id: String, label: String },
    Duplicate,
    /// New round appended, plus what it meant for the pending signal
    Appended {
        round_id: String,
        resolution: Option<Resolution>,
        retried: bool,
    },
}

/// What a signal tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalTick {
    Emitted,
    PlaceholderRefreshed,
    Skipped(EmitDecision),
}

/// Read-only view of the engine state
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub phase: SignalPhase,
    pub pending: Option<PendingSignal>,
    pub history_len: usize,
    pub cooldown: bool,
    pub scoreboard: ScoreboardSnapshot,
}

#[derive(Clone)]
pub struct SignalEngine {
    state: Arc<Mutex<EngineState>>,
    matcher: Arc<PatternMatcher>,
    feed: Arc<dyn OutcomeFeed>,
    sink: Arc<dyn NotificationSink>,
    placeholder_refresh: Duration,
    clock: Clock,
}

impl SignalEngine {
    pub fn new(
        config: &AppConfig,
        feed: Arc<dyn OutcomeFeed>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let offset = config.scoreboard.offset().ok_or_else(|| {
            SignalError::Validation(format!(
                "scoreboard.utc_offset_minutes out of range: {}",
                config.scoreboard.utc_offset_minutes
            ))
        })?;

        let state = EngineState {
            history: RoundHistory::new(config.signal.history_capacity),
            lifecycle: SignalLifecycle::new(config.signal.min_history),
            scoreboard: Scoreboard::new(offset),
        };

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            matcher: Arc::new(PatternMatcher::new(config.signal.patterns.clone())),
            feed,
            sink,
            placeholder_refresh: config.scheduler.placeholder_refresh(),
            clock: Arc::new(Utc::now),
        })
    }

    /// Replace the wall clock (used for day rollover and placeholder timing)
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Poll the feed, append a new round and resolve the pending signal
    pub async fn feed_tick(&self) -> FeedTick {
        let now = (self.clock)();
        self.state.lock().await.roll_scoreboard(now);

        let Some(raw) = self.feed.poll().await else {
            debug!("No data from feed");
            return FeedTick::Unavailable;
        };

        let Some(round) = raw.normalize() else {
            let err = SignalError::UnrecognizedOutcome(raw.outcome_label.clone());
            warn!("Dropping round {}: {}", raw.round_id, err);
            return FeedTick::Unrecognized {
                round_id: raw.round_id,
                label: raw.outcome_label,
            };
        };

        let (tick, dispatch) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            if state.history.observe(&round.round_id, round.outcome) == Observation::Duplicate {
                return FeedTick::Duplicate;
            }
            info!(
                "New round {} -> {}. History: {}",
                round.round_id,
                round.outcome,
                state.history.len()
            );
            state.lifecycle.on_round_appended();

            let decision = state
                .lifecycle
                .try_resolve(&state.history, &mut state.scoreboard);
            let (resolution, retried, dispatch) = match decision {
                ResolveDecision::Retry(dispatch) => (None, true, Some(dispatch)),
                ResolveDecision::Resolved {
                    resolution,
                    dispatch,
                } => (Some(resolution), false, Some(dispatch)),
                ResolveDecision::AwaitingNextRound => {
                    info!("Waiting for the next round to check the result");
                    (None, false, None)
                }
                _ => (None, false, None),
            };

            let tick = FeedTick::Appended {
                round_id: round.round_id,
                resolution,
                retried,
            };
            (tick, dispatch)
        };

        if let Some(dispatch) = dispatch {
            self.execute(dispatch).await;
        }
        tick
    }

    /// Refresh the placeholder or try to emit a new signal
    pub async fn signal_tick(&self) -> SignalTick {
        let now = (self.clock)();

        let (tick, dispatch) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.roll_scoreboard(now);

            let refresh = if state.lifecycle.placeholder_due(now, self.placeholder_refresh) {
                state.lifecycle.refresh_placeholder(now)
            } else {
                None
            };

            if let Some(dispatch) = refresh {
                debug!("Refreshing placeholder");
                (SignalTick::PlaceholderRefreshed, Some(dispatch))
            } else {
                match state.lifecycle.try_emit(&state.history, &self.matcher) {
                    EmitDecision::Emitted(dispatch) => (SignalTick::Emitted, Some(dispatch)),
                    decision => {
                        log_skip(&decision);
                        let placeholder = if state.lifecycle.is_idle() {
                            state.lifecycle.ensure_placeholder(now)
                        } else {
                            None
                        };
                        (SignalTick::Skipped(decision), placeholder)
                    }
                }
            }
        };

        if let Some(dispatch) = dispatch {
            self.execute(dispatch).await;
        }
        tick
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock().await;
        EngineSnapshot {
            phase: state.lifecycle.phase(),
            pending: state.lifecycle.pending().cloned(),
            history_len: state.history.len(),
            cooldown: state.lifecycle.in_cooldown(),
            scoreboard: state.scoreboard.snapshot(),
        }
    }

    /// Run sink calls in order, then record produced handles
    async fn execute(&self, dispatch: Dispatch) {
        let mut produced = Vec::new();

        for action in dispatch.actions {
            match action {
                Action::Delete(handle) => self.sink.delete(handle).await,
                Action::Post { notice, track } => {
                    let handle = self.sink.post(&notice.render()).await;
                    if handle.is_none() {
                        warn!("Message '{}' was not delivered", notice.kind());
                    }
                    if track != Track::Untracked {
                        produced.push((track, handle));
                    }
                }
            }
        }

        if produced.is_empty() {
            return;
        }

        let unwanted: Vec<_> = {
            let mut state = self.state.lock().await;
            produced
                .into_iter()
                .filter_map(|(track, handle)| state.lifecycle.record_post(track, handle))
                .collect()
        };
        for handle in unwanted {
            self.sink.delete(handle).await;
        }
    }
}

fn log_skip(decision: &EmitDecision) {
    match decision {
        EmitDecision::Busy => debug!("Signal pending, not sending a new one"),
        EmitDecision::Cooldown => debug!("In cooldown, not sending a new signal"),
        EmitDecision::WarmingUp { have, need } => {
            debug!("History too short ({}/{}), waiting for more rounds", have, need)
        }
        EmitDecision::NoMatch => debug!("No pattern detected"),
        EmitDecision::Duplicate { pattern_id } => {
            info!("Pattern {} with the same sequence already sent, ignoring", pattern_id)
        }
        EmitDecision::Emitted(_) => {}
    }
}
