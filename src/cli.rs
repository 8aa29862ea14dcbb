use clap::{Parser, Subcommand};

use crate::adapters::HttpOutcomeFeed;
use crate::config::AppConfig;
use crate::domain::format_sequence;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "signalbot")]
#[command(version = "0.1.0")]
#[command(about = "Pattern signal bot for live round outcomes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, then $SIGNALBOT_ENV.toml)
    #[arg(short, long, default_value = "config", env = "SIGNALBOT_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the feed and signal loops
    Run,
    /// Load and validate the configuration
    CheckConfig,
    /// Poll the feed once and print the result
    Poll,
}

/// Print the validated configuration summary
pub fn check_config(config: &AppConfig) {
    println!("\n\x1b[32m✓ Configuration OK\x1b[0m\n");
    println!("  Feed:        {}", config.feed.url);
    println!("  Chat:        {}", config.telegram.chat_id);
    println!("  Min history: {}", config.signal.min_history);
    println!("  Capacity:    {}", config.signal.history_capacity);
    println!(
        "  UTC offset:  {:+} min",
        config.scoreboard.utc_offset_minutes
    );
    println!("\n  Patterns (first match wins):");
    for pattern in &config.signal.patterns {
        println!(
            "    #{:<4} {} -> {}",
            pattern.id,
            format_sequence(&pattern.sequence),
            pattern.signal
        );
    }
    println!();
}

/// Fetch the latest round once and show how it normalizes
pub async fn poll_once(feed: &HttpOutcomeFeed) -> Result<()> {
    println!("\nPolling {}...", feed.url());

    let raw = feed.fetch().await?;
    println!("  Round:   {}", raw.round_id);
    println!("  Label:   {}", raw.outcome_label);

    match raw.normalize() {
        Some(round) => println!("  Outcome: {} ({})\n", round.outcome, round.outcome.as_str()),
        None => println!("  Outcome: \x1b[33munrecognized\x1b[0m\n"),
    }
    Ok(())
}
