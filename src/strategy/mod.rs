//! Signal strategy
//!
//! Pure, I/O-free pieces of the pipeline:
//! - `history` - bounded round history with last-id de-duplication
//! - `matcher` - first-match trailing pattern scan
//! - `lifecycle` - signal state machine (entry, single retry, resolution)
//! - `scoreboard` - per-day win/push/loss tally
//! - `messages` - outbound text templates

pub mod history;
pub mod lifecycle;
pub mod matcher;
pub mod messages;
pub mod scoreboard;

pub use history::{Observation, RoundHistory};
pub use lifecycle::{
    transition, Action, Dispatch, EmitDecision, ResolveDecision, SignalLifecycle, Track,
    Transition, Verdict,
};
pub use matcher::{PatternMatch, PatternMatcher};
pub use messages::{error_text, Notice};
pub use scoreboard::{Scoreboard, ScoreboardSnapshot};
