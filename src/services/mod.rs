pub mod engine;
pub mod scheduler;

pub use engine::{EngineSnapshot, FeedTick, SignalEngine, SignalTick};
pub use scheduler::Scheduler;
