//! Calendar date/datetime arithmetic anchored at the Stata epoch, 1960-01-01
//! (spec §4.6 "Date rule", "Datetime rule").
//!
//! Out of scope per spec §1 ("arithmetic on calendar dates" is an external
//! collaborator) in spirit, but since no crate in the dependency stack does
//! Stata-epoch arithmetic specifically, these are thin wrappers around `chrono`.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{DtaError, Result};

/// The Stata epoch: 1960-01-01.
pub fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1960, 1, 1).expect("1960-01-01 is a valid date")
}

/// The Stata datetime epoch: 1960-01-01T00:00:00.
pub fn epoch_datetime() -> NaiveDateTime {
    epoch_date().and_hms_opt(0, 0, 0).expect("midnight is a valid time")
}

/// Converts a day offset from the Stata epoch into a calendar date.
/// Calendar arithmetic, not naive multiplication (spec design notes §9).
pub fn days_to_date(days: i64) -> Result<NaiveDate> {
    epoch_date()
        .checked_add_signed(Duration::days(days))
        .ok_or(DtaError::DateOverflow)
}

/// Converts a calendar date into a day offset from the Stata epoch.
pub fn date_to_days(date: NaiveDate) -> i64 {
    (date - epoch_date()).num_days()
}

/// Converts a millisecond offset from the Stata datetime epoch into a calendar
/// datetime.
pub fn ms_to_datetime(ms: i64) -> Result<NaiveDateTime> {
    epoch_datetime()
        .checked_add_signed(Duration::milliseconds(ms))
        .ok_or(DtaError::DateOverflow)
}

/// Converts a calendar datetime into a millisecond offset from the Stata
/// datetime epoch.
pub fn datetime_to_ms(dt: NaiveDateTime) -> i64 {
    (dt - epoch_datetime()).num_milliseconds()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_idempotence() {
        for days in [0i64, 1, 22_081, -100] {
            let d = days_to_date(days).unwrap();
            assert_eq!(date_to_days(d), days);
        }
    }

    #[test]
    fn known_date() {
        // 2020-06-15 is 22081 days after 1960-01-01.
        let d = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        assert_eq!(date_to_days(d), 22_081);
        assert_eq!(days_to_date(22_081).unwrap(), d);
    }

    #[test]
    fn datetime_idempotence() {
        for ms in [0i64, 86_400_000, -3_600_000] {
            let dt = ms_to_datetime(ms).unwrap();
            assert_eq!(datetime_to_ms(dt), ms);
        }
    }
}
