//! Next due date of recurring tasks.

use crate::error::{Error, Result};
use crate::tasks::models::RecurrenceUnit;
use chrono::{Days, Months, NaiveDateTime};

/// Advance `current` by `count` units.
///
/// Months and years are calendar-aware: the day is clamped to the end of a
/// shorter month, so January 31st plus one month is the last day of
/// February.
///
/// # Errors
///
/// Returns [`Error::DateOutOfRange`] if the result is not representable.
pub fn advance_by(current: NaiveDateTime, unit: RecurrenceUnit, count: u32) -> Result<NaiveDateTime> {
    let next = match unit {
        RecurrenceUnit::Days => current.checked_add_days(Days::new(u64::from(count))),
        RecurrenceUnit::Weeks => current.checked_add_days(Days::new(7 * u64::from(count))),
        RecurrenceUnit::Months => current.checked_add_months(Months::new(count)),
        RecurrenceUnit::Years => {
            count.checked_mul(12).and_then(|months| current.checked_add_months(Months::new(months)))
        }
    };
    next.ok_or(Error::DateOutOfRange)
}

/// Advance `current` by `count` units named by `unit`.
///
/// # Errors
///
/// Returns [`Error::InvalidRecurrenceUnit`] if `unit` is not days, weeks,
/// months or years, and [`Error::DateOutOfRange`] on overflow. The caller
/// keeps its original date in both cases.
pub fn advance(current: NaiveDateTime, unit: &str, count: u32) -> Result<NaiveDateTime> {
    advance_by(current, RecurrenceUnit::from_str(unit)?, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(8, 30, 0).unwrap()
    }

    #[test]
    fn test_days() {
        assert_eq!(advance(at(2024, 12, 30), "days", 3).unwrap(), at(2025, 1, 2));
    }

    #[test]
    fn test_weeks() {
        assert_eq!(advance(at(2024, 3, 15), "weeks", 2).unwrap(), at(2024, 3, 29));
    }

    #[test]
    fn test_months_clamps_to_leap_day() {
        assert_eq!(advance(at(2024, 1, 31), "months", 1).unwrap(), at(2024, 2, 29));
        assert_eq!(advance(at(2023, 1, 31), "months", 1).unwrap(), at(2023, 2, 28));
    }

    #[test]
    fn test_years() {
        assert_eq!(advance(at(2024, 2, 29), "years", 1).unwrap(), at(2025, 2, 28));
        assert_eq!(advance(at(2020, 6, 1), "years", 4).unwrap(), at(2024, 6, 1));
    }

    #[test]
    fn test_time_of_day_preserved() {
        let next = advance_by(at(2024, 5, 1), RecurrenceUnit::Months, 2).unwrap();
        assert_eq!(next.time(), at(2024, 5, 1).time());
    }

    #[test]
    fn test_unknown_unit() {
        let err = advance(at(2024, 1, 1), "fortnights", 1).unwrap_err();
        assert!(matches!(err, Error::InvalidRecurrenceUnit(ref u) if u == "fortnights"));
    }

    #[test]
    fn test_overflow() {
        let err = advance_by(NaiveDateTime::MAX, RecurrenceUnit::Days, 1).unwrap_err();
        assert!(matches!(err, Error::DateOutOfRange));
    }
}
