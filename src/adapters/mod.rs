pub mod feed;
pub mod telegram;

pub use feed::{parse_latest, HttpOutcomeFeed, OutcomeFeed};
pub use telegram::{NotificationSink, TelegramNotifier};
