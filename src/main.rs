use clap::Parser;
use signalbot::adapters::{HttpOutcomeFeed, TelegramNotifier};
use signalbot::cli::{self, Cli, Commands};
use signalbot::config::AppConfig;
use signalbot::error::{Result, SignalError};
use signalbot::services::{Scheduler, SignalEngine};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod main_runtime;
use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);

    match &cli.command {
        Some(Commands::CheckConfig) => {
            cli::check_config(&config);
        }
        Some(Commands::Poll) => {
            init_logging_simple();
            let feed = HttpOutcomeFeed::new(&config.feed)?;
            cli::poll_once(&feed).await?;
        }
        Some(Commands::Run) | None => {
            init_logging(&config.logging);
            run_bot(config).await?;
        }
    }

    Ok(())
}

/// Load and validate configuration, exiting on failure
fn load_config(cli: &Cli) -> AppConfig {
    let config = match AppConfig::load_from(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("\x1b[31m✗ Failed to load configuration: {}\x1b[0m", e);
            std::process::exit(1);
        }
    };

    if let Err(errors) = config.validate() {
        eprintln!("\x1b[31m✗ Invalid configuration:\x1b[0m");
        for e in &errors {
            eprintln!("  - {}", e);
        }
        std::process::exit(1);
    }

    config
}

async fn run_bot(config: AppConfig) -> Result<()> {
    info!("Starting signal bot");
    info!(
        "Configuration: feed={}, patterns={}, min_history={}",
        config.feed.url,
        config.signal.patterns.len(),
        config.signal.min_history
    );

    let notifier = TelegramNotifier::new(&config.telegram)?;
    if let Err(e) = notifier.verify().await {
        error!("Telegram startup check failed: {}", e);
        notifier.notify_error(&e.to_string()).await;
        return Err(e);
    }

    let feed = Arc::new(HttpOutcomeFeed::new(&config.feed)?);
    let engine = SignalEngine::new(&config, feed, notifier.clone()).map_err(|e| {
        error!("Failed to build engine: {}", e);
        e
    })?;
    let scheduler = Scheduler::new(engine, config.scheduler.clone());

    info!("Bot is running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = scheduler.start() => {
            let err = SignalError::Internal("scheduler stopped unexpectedly".to_string());
            notifier.notify_error(&err.to_string()).await;
            return Err(err);
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
