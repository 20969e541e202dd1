//! Background tasks.

pub mod daily_notifier;

pub use daily_notifier::{run_daily_notifier, DailyLatch};
