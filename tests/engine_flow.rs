//! End-to-end engine behaviour with a scripted feed and a recording sink.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use signalbot::config::AppConfig;
use signalbot::domain::{MessageHandle, Resolution, RoundResult, SignalPhase};
use signalbot::services::{FeedTick, SignalEngine, SignalTick};
use signalbot::strategy::EmitDecision;
use signalbot::{NotificationSink, OutcomeFeed, Pattern};
use signalbot::Outcome::{Banker, Player};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedFeed {
    rounds: Mutex<VecDeque<Option<RoundResult>>>,
}

impl ScriptedFeed {
    fn push(&self, id: &str, label: &str) {
        self.rounds
            .lock()
            .unwrap()
            .push_back(Some(RoundResult::new(id, label)));
    }
}

#[async_trait]
impl OutcomeFeed for ScriptedFeed {
    async fn poll(&self) -> Option<RoundResult> {
        self.rounds.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Default)]
struct RecordingSink {
    next_id: AtomicI64,
    posted: Mutex<Vec<(MessageHandle, String)>>,
    deleted: Mutex<Vec<MessageHandle>>,
}

impl RecordingSink {
    fn count(&self, prefix: &str) -> usize {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, text)| text.starts_with(prefix))
            .count()
    }

    fn handles_of(&self, prefix: &str) -> Vec<MessageHandle> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, text)| text.starts_with(prefix))
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn deleted(&self) -> Vec<MessageHandle> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn post(&self, text: &str) -> Option<MessageHandle> {
        let handle = MessageHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.posted.lock().unwrap().push((handle, text.to_string()));
        Some(handle)
    }

    async fn delete(&self, handle: MessageHandle) {
        self.deleted.lock().unwrap().push(handle);
    }
}

const ENTRY: &str = "𝗔𝗭𝗨𝗟 🔵";
const BANKER_ENTRY: &str = "𝗩𝗘𝗥𝗠𝗘𝗟𝗛𝗢 🔴";
const RETRY: &str = "➡️ Vamos para o 1ª gale";
const LOSS: &str = "🟥 <b>LOSS 🟥</b>";
const SCOREBOARD: &str = "🏆 PLACAR DO DIA 🏆";
const ANALYZING: &str = "🔍 <b>ANALISANDO...</b> 🔍";

struct Harness {
    feed: Arc<ScriptedFeed>,
    sink: Arc<RecordingSink>,
    engine: SignalEngine,
    next_round: u32,
}

impl Harness {
    fn new(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default_config("123:ABC", "-100");
        config.signal.min_history = 2;
        configure(&mut config);

        let feed = Arc::new(ScriptedFeed::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = SignalEngine::new(&config, feed.clone(), sink.clone()).unwrap();
        Self {
            feed,
            sink,
            engine,
            next_round: 1,
        }
    }

    /// One feed tick for a new round followed by one signal tick
    async fn step(&mut self, label: &str) -> (FeedTick, SignalTick) {
        let id = format!("R{}", self.next_round);
        self.next_round += 1;
        self.feed.push(&id, label);
        let feed_tick = self.engine.feed_tick().await;
        let signal_tick = self.engine.signal_tick().await;
        (feed_tick, signal_tick)
    }

    /// Replay an already-seen round id
    async fn repeat(&self, label: &str) -> FeedTick {
        self.feed.push(&format!("R{}", self.next_round - 1), label);
        self.engine.feed_tick().await
    }
}

fn resolution(tick: &FeedTick) -> Option<Resolution> {
    match tick {
        FeedTick::Appended { resolution, .. } => *resolution,
        _ => None,
    }
}

#[tokio::test]
async fn test_win_push_and_loss_over_a_session() {
    let mut h = Harness::new(|config| {
        config.signal.patterns = vec![
            Pattern::new(10, vec![Player, Banker], Player),
            Pattern::new(20, vec![Banker, Banker], Banker),
        ];
    });

    let (_, tick) = h.step("PlayerWon").await;
    assert_eq!(
        tick,
        SignalTick::Skipped(EmitDecision::WarmingUp { have: 1, need: 2 })
    );
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Emitted);

    let (feed, tick) = h.step("PlayerWon").await;
    assert_eq!(resolution(&feed), Some(Resolution::Win));
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Cooldown));

    // Pattern 10 on the same tail stays suppressed
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Duplicate { pattern_id: 10 }));

    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Emitted);
    let (feed, _) = h.step("Tie").await;
    assert_eq!(resolution(&feed), Some(Resolution::Push));

    let (_, tick) = h.step("PlayerWon").await;
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::NoMatch));
    // Last signal was pattern 20, so pattern 10 may fire again
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Emitted);

    let (feed, tick) = h.step("BankerWon").await;
    assert!(matches!(feed, FeedTick::Appended { retried: true, .. }));
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Busy));
    let (feed, _) = h.step("BankerWon").await;
    assert_eq!(resolution(&feed), Some(Resolution::Loss));

    assert_eq!(h.sink.count(ENTRY), 2);
    assert_eq!(h.sink.count(BANKER_ENTRY), 1);
    assert_eq!(h.sink.count("🔥 Estamos a 1 vitória(s)"), 1);
    assert_eq!(h.sink.count("🔥 Estamos a 2 vitória(s)"), 1);
    assert_eq!(h.sink.count(LOSS), 1);
    assert_eq!(h.sink.count(SCOREBOARD), 3);

    // Retry notice is removed once its signal resolves
    let retry = h.sink.handles_of(RETRY);
    assert_eq!(retry.len(), 1);
    assert!(h.sink.deleted().contains(&retry[0]));

    let snapshot = h.engine.snapshot().await;
    assert_eq!(snapshot.phase, SignalPhase::Idle);
    assert_eq!(
        (
            snapshot.scoreboard.wins,
            snapshot.scoreboard.pushes,
            snapshot.scoreboard.losses,
            snapshot.scoreboard.streak
        ),
        (1, 1, 1, 0)
    );
}

#[tokio::test]
async fn test_repeated_round_never_resolves_twice() {
    let mut h = Harness::new(|_| {});
    h.step("PlayerWon").await;
    h.step("BankerWon").await;

    // Emission round replayed: still pending
    assert_eq!(h.repeat("BankerWon").await, FeedTick::Duplicate);
    assert_eq!(h.engine.snapshot().await.phase, SignalPhase::Pending);

    let (feed, _) = h.step("BankerWon").await;
    assert!(matches!(feed, FeedTick::Appended { retried: true, .. }));

    // The missed round replayed does not count as the retry attempt
    assert_eq!(h.repeat("BankerWon").await, FeedTick::Duplicate);
    let snapshot = h.engine.snapshot().await;
    assert_eq!(snapshot.phase, SignalPhase::Retry);
    assert_eq!(snapshot.scoreboard.losses, 0);

    let (feed, _) = h.step("Tie").await;
    assert_eq!(resolution(&feed), Some(Resolution::Push));
    assert_eq!(h.sink.count(RETRY), 1);
}

#[tokio::test]
async fn test_cooldown_holds_until_a_new_round() {
    let mut h = Harness::new(|config| {
        config.signal.patterns = vec![
            Pattern::new(1, vec![Banker, Banker], Player),
            Pattern::new(2, vec![Banker], Player),
        ];
    });
    h.step("BankerWon").await;
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Emitted);
    let (feed, tick) = h.step("PlayerWon").await;
    assert_eq!(resolution(&feed), Some(Resolution::Win));
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Cooldown));

    // Feed hiccups and replays keep the cooldown
    assert_eq!(h.engine.feed_tick().await, FeedTick::Unavailable);
    assert_eq!(h.repeat("PlayerWon").await, FeedTick::Duplicate);
    assert_eq!(
        h.engine.signal_tick().await,
        SignalTick::Skipped(EmitDecision::Cooldown)
    );

    // A fresh round lifts the cooldown right away
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Emitted);
    assert_eq!(h.engine.snapshot().await.pending.unwrap().pattern_id, 2);
}

#[tokio::test]
async fn test_same_pattern_same_tail_is_suppressed() {
    let mut h = Harness::new(|_| {});
    h.step("PlayerWon").await;
    h.step("BankerWon").await;
    h.step("PlayerWon").await;

    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Duplicate { pattern_id: 10 }));
    assert_eq!(
        h.engine.signal_tick().await,
        SignalTick::Skipped(EmitDecision::Duplicate { pattern_id: 10 })
    );

    // A non-matching round in between does not release the pair
    let (_, tick) = h.step("PlayerWon").await;
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::NoMatch));
    let (_, tick) = h.step("BankerWon").await;
    assert_eq!(tick, SignalTick::Skipped(EmitDecision::Duplicate { pattern_id: 10 }));

    assert_eq!(h.sink.count(ENTRY), 1);
    assert_eq!(h.engine.snapshot().await.phase, SignalPhase::Idle);
}

#[tokio::test]
async fn test_history_is_capped_and_labels_normalized() {
    let mut h = Harness::new(|config| {
        config.signal.history_capacity = 3;
        config.signal.min_history = 3;
    });

    for label in ["🔵", "Suited Tie", "banker wins", "PlayerWon"] {
        let (feed, _) = h.step(label).await;
        assert!(matches!(feed, FeedTick::Appended { .. }), "{label}");
    }
    assert_eq!(h.engine.snapshot().await.history_len, 3);

    let (feed, _) = h.step("Void").await;
    assert!(matches!(feed, FeedTick::Unrecognized { .. }));
    assert_eq!(h.engine.snapshot().await.history_len, 3);
}

#[tokio::test]
async fn test_placeholder_is_refreshed_while_idle() {
    let elapsed = Arc::new(AtomicI64::new(0));
    let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let mut h = Harness::new(|config| {
        config.signal.min_history = 5;
        config.scheduler.placeholder_refresh_secs = 120;
    });
    let clock = elapsed.clone();
    h.engine = h
        .engine
        .clone()
        .with_clock(move || start + Duration::seconds(clock.load(Ordering::SeqCst)));

    h.step("PlayerWon").await;
    assert_eq!(h.sink.count(ANALYZING), 1);

    elapsed.store(60, Ordering::SeqCst);
    assert_eq!(
        h.engine.signal_tick().await,
        SignalTick::Skipped(EmitDecision::WarmingUp { have: 1, need: 5 })
    );
    assert_eq!(h.sink.count(ANALYZING), 1);

    elapsed.store(121, Ordering::SeqCst);
    assert_eq!(h.engine.signal_tick().await, SignalTick::PlaceholderRefreshed);
    let placeholders = h.sink.handles_of(ANALYZING);
    assert_eq!(placeholders.len(), 2);
    assert_eq!(h.sink.deleted(), vec![placeholders[0]]);

    // Freshly posted, not due again
    assert!(matches!(
        h.engine.signal_tick().await,
        SignalTick::Skipped(EmitDecision::WarmingUp { .. })
    ));
    assert_eq!(h.sink.count(ANALYZING), 2);
}
