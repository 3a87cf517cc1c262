//! Bookable time slots.
//!
//! [`SimulatedAvailability`] derives slots from the date alone until a
//! scheduling endpoint exists; callers go through the [`Availability`] trait
//! so the source can be swapped without touching them.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use std::fmt;

/// First bookable hour (inclusive)
pub const FIRST_SLOT_HOUR: u32 = 8;

/// Last bookable hour (inclusive)
pub const LAST_SLOT_HOUR: u32 = 16;

/// A bookable start time on the selected date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// Slot starting on the full hour
    #[must_use]
    pub fn at_hour(hour: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, 0, 0).map(Self)
    }

    /// Start time
    #[must_use]
    pub const fn time(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Source of bookable slots for a date
pub trait Availability: Send + Sync {
    /// Slots that can be booked on `date`
    fn slots(&self, date: NaiveDate) -> Vec<TimeSlot>;
}

/// Deterministic stand-in for a scheduling backend
///
/// Starts from the hourly slots 08:00 to 16:00 and removes `day mod 3` of
/// them, at indices `(day + i) mod 9`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedAvailability;

impl Availability for SimulatedAvailability {
    fn slots(&self, date: NaiveDate) -> Vec<TimeSlot> {
        let all: Vec<TimeSlot> = (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
            .filter_map(TimeSlot::at_hour)
            .collect();
        let count = all.len();
        let day = date.day() as usize;
        let removed: Vec<usize> = (0..day % 3).map(|i| (day + i) % count).collect();

        all.into_iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, slot)| slot)
            .collect()
    }
}

/// Saturday or Sunday
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `date` itself when it is a weekday, otherwise the following Monday
#[must_use]
pub fn next_weekday(date: NaiveDate) -> NaiveDate {
    let skip = match date.weekday() {
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    };
    date.checked_add_days(Days::new(skip)).unwrap_or(date)
}
