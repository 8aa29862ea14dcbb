use super::engine::SignalEngine;
use crate::config::SchedulerConfig;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};

/// Drives the feed and signal loops of a [`SignalEngine`]
pub struct Scheduler {
    engine: SignalEngine,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(engine: SignalEngine, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    /// Run both loops until one of them ends
    pub async fn start(&self) {
        info!(
            "Starting scheduler (feed every {:?}, signals every {:?})",
            self.config.feed_poll(),
            self.config.signal_interval()
        );

        let feed_task = self.spawn_feed_loop();
        let signal_task = self.spawn_signal_loop();

        tokio::select! {
            r = feed_task => {
                error!("Feed loop ended: {:?}", r);
            }
            r = signal_task => {
                error!("Signal loop ended: {:?}", r);
            }
        }
    }

    fn spawn_feed_loop(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let every = self.config.feed_poll();
        let backoff = self.config.feed_error_backoff();

        tokio::spawn(async move {
            let mut poll_interval = interval(every);
            poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                poll_interval.tick().await;

                let tick_engine = engine.clone();
                match guarded("feed", async move { tick_engine.feed_tick().await }).await {
                    Some(tick) => debug!(?tick, "Feed tick"),
                    None => sleep(backoff).await,
                }
            }
        })
    }

    fn spawn_signal_loop(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let every = self.config.signal_interval();
        let start_delay = self.config.signal_start_delay();
        let backoff = self.config.signal_error_backoff();

        tokio::spawn(async move {
            // Give the feed a head start
            sleep(start_delay).await;

            let mut signal_interval = interval(every);
            signal_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                signal_interval.tick().await;

                let tick_engine = engine.clone();
                match guarded("signal", async move { tick_engine.signal_tick().await }).await {
                    Some(tick) => debug!(?tick, "Signal tick"),
                    None => sleep(backoff).await,
                }
            }
        })
    }
}

/// Run one tick on its own task so a panic cannot take the loop down
async fn guarded<F, T>(name: &str, tick: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(tick).await {
        Ok(value) => Some(value),
        Err(e) => {
            error!("{} tick failed: {}", name, e);
            None
        }
    }
}
