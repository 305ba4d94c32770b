//! Common calendar math helpers.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;

/// Returns `true` if provided year is leap.
#[inline]
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns number of days in specified month.
pub(crate) fn days_in_month(year: i32, month: u8) -> u8 {
    if month == 0 || month > 12 {
        panic!("Invalid month: {month}");
    }

    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => unreachable!(),
    }
}

/// Returns the date (day in the month) of the N-th specified day of the week,
/// with days of the week counted from Monday (0) to Sunday (6).
///
/// Returns `None` when the month has no N-th such weekday.
pub(crate) fn nth_weekday(year: i32, month: u8, weekday: u8, n: u8) -> Option<u8> {
    if month == 0 || month > 12 || weekday > 6 || n == 0 || n > 5 {
        panic!("Invalid month, day of week or nth occurrence: {month:02}/{weekday}/{n}");
    }

    let first = NaiveDate::from_ymd_opt(year, u32::from(month), 1)
        .unwrap()
        .weekday()
        .num_days_from_monday() as u8;
    let day = 1 + (weekday + 7 - first) % 7 + 7 * (n - 1);

    if day > days_in_month(year, month) {
        None
    } else {
        Some(day)
    }
}

/// Puts a date at the given hour of the day, with zeroed minutes and seconds.
pub(crate) fn at_hour(date: NaiveDate, hour: u8) -> NaiveDateTime {
    if hour > 23 {
        panic!("Invalid hour: {hour}");
    }

    date.and_time(NaiveTime::from_hms_opt(u32::from(hour), 0, 0).unwrap_or_default())
}

/// Returns the Monday of the week the date falls into.
#[inline]
pub(crate) fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Advances a (year, month) pair by `n` months, carrying the year.
pub(crate) fn add_months(year: i32, month: u8, n: u32) -> (i32, u8) {
    let zero_based = u32::from(month - 1) + n;
    (year + (zero_based / 12) as i32, (zero_based % 12) as u8 + 1)
}

/// Number of whole calendar months between the months of two dates,
/// ignoring the day components. Negative when `to` is in an earlier month.
#[inline]
pub(crate) fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// Maps a wall-clock instant into the given timezone.
///
/// Ambiguous local times (DST fold) resolve to the earliest valid offset.
/// Nonexistent local times (DST gap) are pushed forward in 15-minute steps
/// until a valid local time exists.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    for _ in 0..32 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += TimeDelta::minutes(15),
        }
    }

    // No real timezone has an 8-hour gap, but stay deterministic anyway.
    tz.from_utc_datetime(&naive)
}
