//! Per-day win/push/loss tally
//!
//! The day boundary is evaluated in a fixed UTC offset so the scoreboard
//! resets at local midnight of the channel's audience.

use crate::domain::Resolution;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Scoreboard {
    wins: u32,
    pushes: u32,
    losses: u32,
    /// Consecutive win-equivalent resolutions
    streak: u32,
    reset_date: Option<NaiveDate>,
    offset: FixedOffset,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreboardSnapshot {
    pub wins: u32,
    pub pushes: u32,
    pub losses: u32,
    pub streak: u32,
}

impl fmt::Display for ScoreboardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🏆 PLACAR DO DIA 🏆\n\
             ✅ GREENS: {}\n\
             🤝 EMPATES: {}\n\
             ⛔ LOSS: {}",
            self.wins, self.pushes, self.losses
        )
    }
}

impl Scoreboard {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            wins: 0,
            pushes: 0,
            losses: 0,
            streak: 0,
            reset_date: None,
            offset,
        }
    }

    /// Calendar date of `now` in the scoreboard timezone
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Zero all counters when `today` differs from the stored reset date.
    ///
    /// Returns `true` only on an actual rollover; the very first call just
    /// stamps the date.
    pub fn maybe_reset_for_new_day(&mut self, today: NaiveDate) -> bool {
        match self.reset_date {
            Some(date) if date == today => false,
            Some(previous) => {
                self.wins = 0;
                self.pushes = 0;
                self.losses = 0;
                self.streak = 0;
                self.reset_date = Some(today);
                info!("Scoreboard reset: {} -> {}", previous, today);
                true
            }
            None => {
                self.reset_date = Some(today);
                false
            }
        }
    }

    pub fn record_win(&mut self) {
        self.wins += 1;
        self.streak += 1;
    }

    pub fn record_push(&mut self) {
        self.pushes += 1;
        self.streak += 1;
    }

    pub fn record_loss(&mut self) {
        self.losses += 1;
        self.streak = 0;
    }

    pub fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Win => self.record_win(),
            Resolution::Push => self.record_push(),
            Resolution::Loss => self.record_loss(),
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn reset_date(&self) -> Option<NaiveDate> {
        self.reset_date
    }

    pub fn snapshot(&self) -> ScoreboardSnapshot {
        ScoreboardSnapshot {
            wins: self.wins,
            pushes: self.pushes,
            losses: self.losses,
            streak: self.streak,
        }
    }
}
