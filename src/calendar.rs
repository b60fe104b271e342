use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use thiserror::Error;

const HOURS_PER_EFFORT_DAY: f64 = 24.0;
const EFFORT_DAYS_PER_WEEK: i64 = 7;
const WEEKEND_LENGTH_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("effort duration {0} must be a finite, non-negative number of days")]
    InvalidDuration(f64),
    #[error("a {effort_days} effort-day span starting {start} ends outside the supported date range")]
    OutOfRange {
        start: NaiveDateTime,
        effort_days: f64,
    },
}

/// Business-day calendar with a fixed Saturday/Sunday closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkCalendar;

impl WorkCalendar {
    pub const NON_WORKING_DAYS: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

    pub fn new() -> Self {
        Self
    }

    /// Check if a date is a working day
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !Self::NON_WORKING_DAYS.contains(&date.weekday())
    }

    /// Move an instant that falls on the weekend to the same time of day on the
    /// following Monday. Working-day instants are returned unchanged.
    ///
    /// Returns `None` only when the shifted instant is not representable.
    pub fn snap_to_working_day(&self, instant: NaiveDateTime) -> Option<NaiveDateTime> {
        let shift = match instant.weekday() {
            Weekday::Sat => 2,
            Weekday::Sun => 1,
            _ => return Some(instant),
        };
        instant.checked_add_signed(TimeDelta::try_days(shift)?)
    }

    /// Compute the end of a span of `effort_days` starting at `start`.
    ///
    /// The span is `round(24 * effort_days)` hours long, extended by one
    /// weekend for every full seven effort-days, and the result is finally
    /// moved off the weekend. This is an approximation of a business-day walk
    /// and must stay exactly this formula so schedules remain comparable.
    pub fn compute_end(
        &self,
        start: NaiveDateTime,
        effort_days: f64,
    ) -> Result<NaiveDateTime, CalendarError> {
        if !effort_days.is_finite() || effort_days < 0.0 {
            return Err(CalendarError::InvalidDuration(effort_days));
        }
        let out_of_range = || CalendarError::OutOfRange { start, effort_days };

        let hours = Self::effort_hours(effort_days);
        let weekend_pairs = (effort_days.trunc() as i64) / EFFORT_DAYS_PER_WEEK;

        let work = TimeDelta::try_hours(hours).ok_or_else(out_of_range)?;
        let weekends = weekend_pairs
            .checked_mul(WEEKEND_LENGTH_DAYS)
            .and_then(TimeDelta::try_days)
            .ok_or_else(out_of_range)?;

        let candidate = start
            .checked_add_signed(work)
            .and_then(|end| end.checked_add_signed(weekends))
            .ok_or_else(out_of_range)?;

        self.snap_to_working_day(candidate).ok_or_else(out_of_range)
    }

    /// Whole hours of work in `effort_days`, rounded half away from zero.
    fn effort_hours(effort_days: f64) -> i64 {
        (HOURS_PER_EFFORT_DAY * effort_days).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn effort_hours_rounds_half_away_from_zero() {
        assert_eq!(WorkCalendar::effort_hours(0.0), 0);
        // 24 * 0.0625 = 1.5
        assert_eq!(WorkCalendar::effort_hours(0.0625), 2);
        assert_eq!(WorkCalendar::effort_hours(0.5), 12);
        assert_eq!(WorkCalendar::effort_hours(1.0 / 3.0), 8);
    }

    #[test]
    fn fractional_days_keep_time_of_day() {
        let cal = WorkCalendar::new();
        // Tuesday plus half a day stays on Tuesday at noon.
        let end = cal.compute_end(at_midnight(2023, 10, 3), 0.5).unwrap();
        assert_eq!(end, at_midnight(2023, 10, 3) + TimeDelta::hours(12));
    }

    #[test]
    fn negative_and_nan_durations_are_rejected() {
        let cal = WorkCalendar::new();
        let start = at_midnight(2023, 10, 2);
        assert_eq!(
            cal.compute_end(start, -1.0),
            Err(CalendarError::InvalidDuration(-1.0))
        );
        assert!(matches!(
            cal.compute_end(start, f64::NAN),
            Err(CalendarError::InvalidDuration(_))
        ));
    }

    #[test]
    fn huge_durations_report_out_of_range() {
        let cal = WorkCalendar::new();
        let start = at_midnight(2023, 10, 2);
        assert!(matches!(
            cal.compute_end(start, 1e15),
            Err(CalendarError::OutOfRange { .. })
        ));
    }

    #[test]
    fn snap_moves_weekend_to_monday() {
        let cal = WorkCalendar::new();
        let saturday = at_midnight(2023, 10, 7) + TimeDelta::hours(9);
        let sunday = at_midnight(2023, 10, 8);
        let monday = at_midnight(2023, 10, 9);
        assert_eq!(
            cal.snap_to_working_day(saturday),
            Some(monday + TimeDelta::hours(9))
        );
        assert_eq!(cal.snap_to_working_day(sunday), Some(monday));
        assert_eq!(cal.snap_to_working_day(monday), Some(monday));
    }
}
