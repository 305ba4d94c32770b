//! Recurrence rules with timezone-aware occurrence computation.
//!
//! A [`Rule`] describes a daily, weekly or monthly recurrence: a start
//! instant, an hour of the day, an optional exclusive end or total count,
//! optional exceptions, and a timezone all calendar arithmetic happens in.
//! Computing a rule produces an [`OccurrenceSeries`] that can be read out
//! as RFC 3339 strings in UTC, Unix timestamps or zoned instants.
//!
//! ```
//! use chrono::NaiveDate;
//! use chrono_tz::Tz;
//! use recur_lite::{Occurrence, OutputFormat, Rule, WEEKEND};
//!
//! # fn main() -> recur_lite::Result<()> {
//! let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
//! let last_of_january = NaiveDate::from_ymd_opt(2014, 1, 31).unwrap();
//!
//! // Every weekday of January 2014, at 08:00 UTC.
//! let mut rule = Rule::daily(start, Tz::UTC)?;
//! rule.except_weekdays(Some(&WEEKEND))?
//!     .on_hour(8)?
//!     .end_on(Some(last_of_january))?;
//!
//! let series = rule.compute(None, None, OutputFormat::Iso)?;
//! assert_eq!(series.count(), 23);
//! assert_eq!(series.first(), Some(Occurrence::Iso("2014-01-01T08:00:00+00:00".into())));
//! assert_eq!(series.last(), Some(Occurrence::Iso("2014-01-31T08:00:00+00:00".into())));
//! # Ok(())
//! # }
//! ```
//!
//! Rule specs serialize to a flat, tagged JSON record and can be rebuilt
//! from one:
//!
//! ```
//! use recur_lite::{OutputFormat, Rule};
//!
//! let json = r#"{
//!     "rule": "weekly",
//!     "start": "2014-01-01T08:00:00+00:00",
//!     "end": null,
//!     "repeat": 10,
//!     "timezone": "UTC",
//!     "on_hour": 8,
//!     "every_nth_week": 2,
//!     "on_days": [3, 6],
//!     "except_months": null
//! }"#;
//!
//! let rule = Rule::from_spec(serde_json::from_str(json).unwrap()).unwrap();
//! let series = rule.compute(None, None, OutputFormat::Posix).unwrap();
//! assert_eq!(series.count(), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod result;
pub mod rule;
pub mod spec;

mod engine;
mod utils;

pub use cursor::{OccurrenceCursor, DEFAULT_BATCH_SIZE};
pub use error::RuleError;
pub use result::{Occurrence, OccurrenceSeries, OutputFormat};
pub use rule::Rule;
pub use spec::{
    DailySpec, DayOfMonthRule, KindSpec, MonthlySpec, RuleSpec, WeekdayRule, WeeklySpec, APRIL,
    AUGUST, DECEMBER, FEBRUARY, FRIDAY, JANUARY, JULY, JUNE, MARCH, MAY, MONDAY, NOVEMBER, OCTOBER,
    SATURDAY, SEPTEMBER, SUNDAY, THURSDAY, TUESDAY, WEDNESDAY, WEEKEND,
};

/// Convenience alias for results with the crate error type.
pub type Result<T, E = RuleError> = std::result::Result<T, E>;
