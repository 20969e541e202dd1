//! Daily reservation notifier task.
//!
//! Sleeps until the configured local trigger time, asks the notifier to
//! deliver the day's reservations, and repeats. Delivery happens at most once
//! per calendar day; a failed delivery is logged and the task waits for the
//! next day.
//!
//! # Graceful Shutdown
//!
//! The task exits when the cancellation token is cancelled, including while
//! it is sleeping.

use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::services::Notifier;

/// Remembers the last calendar day a delivery was attempted
#[derive(Debug, Default, Clone, Copy)]
pub struct DailyLatch {
    last_fired: Option<NaiveDate>,
}

impl DailyLatch {
    /// Returns true, and latches, the first time it is asked on a given day
    pub fn try_fire(&mut self, today: NaiveDate) -> bool {
        if self.last_fired == Some(today) {
            return false;
        }
        self.last_fired = Some(today);
        true
    }

    pub fn last_fired(&self) -> Option<NaiveDate> {
        self.last_fired
    }
}

/// Time left from `now` until the next occurrence of `trigger_at`
///
/// Once today's trigger time has been reached the next occurrence is tomorrow.
pub fn duration_until_next(now: NaiveDateTime, trigger_at: NaiveTime) -> Duration {
    let today = now.date();
    let target = if now.time() < trigger_at {
        today.and_time(trigger_at)
    } else {
        (today + ChronoDuration::days(1)).and_time(trigger_at)
    };

    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Start the daily notifier task.
///
/// Returns when the cancellation token is triggered.
#[instrument(skip_all, name = "task.daily_notifier")]
pub async fn run_daily_notifier(
    notifier: Arc<dyn Notifier>,
    trigger_at: NaiveTime,
    cancel_token: CancellationToken,
) {
    info!(trigger_at = %trigger_at, "Starting daily notifier task");

    let mut latch = DailyLatch::default();

    loop {
        let wait = duration_until_next(Local::now().naive_local(), trigger_at);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                fire_once(notifier.as_ref(), &mut latch, Local::now().date_naive()).await;
            }
            _ = cancel_token.cancelled() => {
                info!("Daily notifier received shutdown signal, exiting");
                break;
            }
        }
    }

    info!("Daily notifier task stopped");
}

/// Deliver `today`'s reservations unless the latch already fired today.
/// Returns whether a delivery was attempted.
pub async fn fire_once(notifier: &dyn Notifier, latch: &mut DailyLatch, today: NaiveDate) -> bool {
    if !latch.try_fire(today) {
        return false;
    }

    match notifier.send_daily_reservations(today).await {
        Ok(delivered) => info!(%today, delivered, "Daily reservations sent"),
        Err(e) => error!(%today, error = %e, "Failed to send daily reservations"),
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NotifierError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send_daily_reservations(&self, _date: NaiveDate) -> Result<usize, NotifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifierError::Rejected(503))
            } else {
                Ok(3)
            }
        }
    }

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_until_later_today() {
        let wait = duration_until_next(at((2024, 5, 1), 7, 30), eight());
        assert_eq!(wait, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_duration_rolls_to_tomorrow() {
        let wait = duration_until_next(at((2024, 5, 1), 8, 0), eight());
        assert_eq!(wait, Duration::from_secs(24 * 3600));

        let wait = duration_until_next(at((2024, 5, 1), 23, 0), eight());
        assert_eq!(wait, Duration::from_secs(9 * 3600));
    }

    #[test]
    fn test_latch_fires_once_per_day() {
        let mut latch = DailyLatch::default();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        assert!(latch.try_fire(day));
        assert!(!latch.try_fire(day));
        assert!(latch.try_fire(day.succ_opt().unwrap()));
        assert_eq!(latch.last_fired(), day.succ_opt());
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_latch() {
        let notifier = CountingNotifier { calls: AtomicUsize::new(0), fail: true };
        let mut latch = DailyLatch::default();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        assert!(fire_once(&notifier, &mut latch, day).await);
        assert!(!fire_once(&notifier, &mut latch, day).await);
        assert!(fire_once(&notifier, &mut latch, day.succ_opt().unwrap()).await);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_task() {
        let notifier = Arc::new(CountingNotifier { calls: AtomicUsize::new(0), fail: false });
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(run_daily_notifier(notifier.clone(), eight(), cancel_token.clone()));
        cancel_token.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("task should stop after cancellation")
            .unwrap();
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }
}
