//! Calendar-day helpers.
//!
//! Everything in the evaluation path works on `NaiveDate`: a habit is active or
//! completed on a calendar day, never at an instant.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` days ending at (and including) `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1) - 1);
        let start = end.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = NaiveDate::from_ymd_opt(date.year(), date.month(), days_in_month(date))
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.end - self.start).num_days() as u64 + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Iterate every day from `start` to `end`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// First day of the displayed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn first_day(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }

    /// Position of `weekday` in a week beginning on `self` (0..7).
    pub fn index_of(self, weekday: Weekday) -> usize {
        match self {
            WeekStart::Monday => weekday.num_days_from_monday() as usize,
            WeekStart::Sunday => weekday.num_days_from_sunday() as usize,
        }
    }

    /// The seven weekdays in display order.
    pub fn ordered_weekdays(self) -> [Weekday; 7] {
        let mut out = [Weekday::Mon; 7];
        let mut day = self.first_day();
        for slot in out.iter_mut() {
            *slot = day;
            day = day.succ();
        }
        out
    }
}

/// Days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = (date.year(), date.month());
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(y, m, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 31,
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Short English label for a weekday.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_rejects_reversed_bounds() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn range_iterates_inclusive() {
        let range = DateRange::new(date(2024, 1, 30), date(2024, 2, 2)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(range.len(), 4);
        assert_eq!(days.last(), Some(&date(2024, 2, 2)));
    }

    #[test]
    fn month_of_handles_leap_february() {
        let range = DateRange::month_of(date(2024, 2, 14));
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));
        assert_eq!(days_in_month(date(2023, 2, 1)), 28);
        assert_eq!(days_in_month(date(2023, 12, 5)), 31);
    }

    #[test]
    fn trailing_window_ends_on_given_day() {
        let range = DateRange::trailing(date(2024, 1, 7), 7);
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(DateRange::trailing(date(2024, 1, 7), 0).len(), 1);
    }

    #[test]
    fn week_start_orders_weekdays() {
        assert_eq!(WeekStart::Sunday.ordered_weekdays()[0], Weekday::Sun);
        assert_eq!(WeekStart::Monday.ordered_weekdays()[6], Weekday::Sun);
        assert_eq!(WeekStart::Sunday.index_of(Weekday::Sat), 6);
    }

    #[test]
    fn week_monday_of_sunday_is_previous_monday() {
        // 2024-01-07 is a Sunday
        assert_eq!(week_monday(date(2024, 1, 7)), date(2024, 1, 1));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("2024-03-09").unwrap(), date(2024, 3, 9));
        assert!(parse_date("03/09/2024").is_err());
    }
}
