use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::core::error::EngineError;

/// Opening hours and slot grid used for office reservations
///
/// A slot is `slot_minutes` long and must end by `closing`. Bookable days
/// start today and run for `horizon_days` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub slot_minutes: u32,
    pub horizon_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
            horizon_days: 14,
        }
    }
}

impl BookingPolicy {
    /// Days open for booking, starting at `today`
    pub fn days_from(&self, today: NaiveDate) -> Vec<NaiveDate> {
        today.iter_days().take(self.horizon_days as usize).collect()
    }

    /// Every slot start time of a working day, ascending
    pub fn slots(&self) -> Vec<NaiveTime> {
        let step = Duration::minutes(i64::from(self.slot_minutes));
        if step <= Duration::zero() {
            return Vec::new();
        }

        let mut slots = Vec::new();
        let mut start = self.opening;
        // Stop at closing; NaiveTime wraps past midnight
        while start < self.closing && self.closing - start >= step {
            slots.push(start);
            start += step;
        }
        slots
    }

    pub fn in_window(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today && (date - today).num_days() < i64::from(self.horizon_days)
    }

    /// Reject a booking outside the window, off the slot grid, or already started
    pub fn check(&self, date: NaiveDate, time: NaiveTime, now: NaiveDateTime) -> Result<(), EngineError> {
        if !self.in_window(date, now.date()) {
            return Err(EngineError::InvalidSlot(format!(
                "{} is outside the {} day booking window",
                date, self.horizon_days
            )));
        }
        if !self.slots().contains(&time) {
            return Err(EngineError::InvalidSlot(format!(
                "{} is not a slot start between {} and {}",
                time, self.opening, self.closing
            )));
        }
        if date == now.date() && time <= now.time() {
            return Err(EngineError::InvalidSlot(format!("{} {} has already started", date, time)));
        }
        Ok(())
    }
}
