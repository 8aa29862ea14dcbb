pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod strategy;

pub use adapters::{HttpOutcomeFeed, NotificationSink, OutcomeFeed, TelegramNotifier};
pub use config::AppConfig;
pub use domain::{Outcome, Pattern, Resolution, RoundResult, SignalPhase};
pub use error::{Result, SignalError};
pub use services::{Scheduler, SignalEngine};
pub use strategy::{PatternMatcher, RoundHistory, Scoreboard, SignalLifecycle};
