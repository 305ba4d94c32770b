//! Recurrence specification records and their validation.
//!
//! A [`RuleSpec`] is a plain value record: it carries no behavior beyond
//! validation and is only ever replaced wholesale, never mutated in place.
//! The serialized shape is the crate's canonical wire record, keyed by the
//! `rule` tag (`"daily"`, `"weekly"` or `"monthly"`).

use crate::{error::RuleError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, SecondsFormat, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;

/// Monday, first day of the week.
pub const MONDAY: u8 = 0;
/// Tuesday.
pub const TUESDAY: u8 = 1;
/// Wednesday.
pub const WEDNESDAY: u8 = 2;
/// Thursday.
pub const THURSDAY: u8 = 3;
/// Friday.
pub const FRIDAY: u8 = 4;
/// Saturday.
pub const SATURDAY: u8 = 5;
/// Sunday, last day of the week.
pub const SUNDAY: u8 = 6;
/// Saturday and Sunday.
pub const WEEKEND: [u8; 2] = [SATURDAY, SUNDAY];

/// January.
pub const JANUARY: u8 = 1;
/// February.
pub const FEBRUARY: u8 = 2;
/// March.
pub const MARCH: u8 = 3;
/// April.
pub const APRIL: u8 = 4;
/// May.
pub const MAY: u8 = 5;
/// June.
pub const JUNE: u8 = 6;
/// July.
pub const JULY: u8 = 7;
/// August.
pub const AUGUST: u8 = 8;
/// September.
pub const SEPTEMBER: u8 = 9;
/// October.
pub const OCTOBER: u8 = 10;
/// November.
pub const NOVEMBER: u8 = 11;
/// December.
pub const DECEMBER: u8 = 12;

/// Validated recurrence specification, one kind payload per rule family.
///
/// Timestamps are stored with the fixed offset the rule timezone assigns to
/// their wall clock; `end` is an exclusive upper bound and is mutually
/// exclusive with `repeat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// First instant the rule may fire at, normalized to `on_hour`.
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<FixedOffset>,
    /// Exclusive upper bound of the computed series, if any.
    #[serde(default, serialize_with = "serialize_instant_opt")]
    pub end: Option<DateTime<FixedOffset>>,
    /// Total number of occurrences to produce, if any.
    #[serde(default)]
    pub repeat: Option<u32>,
    /// Timezone all wall-clock arithmetic happens in.
    pub timezone: Tz,
    /// Hour of the day (0-23) every occurrence fires at.
    pub on_hour: u8,
    /// Months (1-12) the rule never fires in; may not cover the whole year
    /// nor include the start month.
    #[serde(default)]
    pub except_months: Option<BTreeSet<u8>>,
    /// Kind tag plus the kind specific fields.
    #[serde(flatten)]
    pub kind: KindSpec,
}

/// Kind specific payload of a [`RuleSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum KindSpec {
    /// Fires every N-th day, with optional weekday exceptions.
    Daily(DailySpec),
    /// Fires on selected weekdays of every N-th week.
    Weekly(WeeklySpec),
    /// Fires once per every N-th month, on a fixed day number or on the
    /// N-th occurrence of a weekday.
    Monthly(MonthlySpec),
}

/// Daily rule fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySpec {
    /// Days between two occurrences (1-365).
    pub every_nth_day: u16,
    /// Weekdays (Monday = 0) the rule skips; never all seven, never the
    /// start weekday.
    #[serde(default)]
    pub except_days: Option<BTreeSet<u8>>,
}

/// Weekly rule fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySpec {
    /// Weeks between two active weeks (1-53).
    pub every_nth_week: u8,
    /// Weekdays (Monday = 0) producing occurrences within an active week.
    pub on_days: BTreeSet<u8>,
}

/// Monthly rule fields; exactly one of the two sub-rules must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySpec {
    /// Fixed day-number form, e.g. "the 28th of every 2nd month".
    #[serde(default)]
    pub day_of_month_rule: Option<DayOfMonthRule>,
    /// Counted weekday form, e.g. "the 3rd Thursday of every 3rd month".
    #[serde(default)]
    pub weekday_rule: Option<WeekdayRule>,
}

/// Fixed day-number monthly sub-rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOfMonthRule {
    /// Day of the month (1-31). Months missing the day are skipped.
    pub day: u8,
    /// Months between two occurrences (1-12).
    pub every_nth: u8,
}

/// Counted weekday monthly sub-rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayRule {
    /// Which occurrence of the weekday within the month (1-5). Months
    /// without that many are skipped.
    pub count: u8,
    /// Weekday to count (Monday = 0).
    pub weekday: u8,
    /// Months between two occurrences (1-12).
    pub every_nth: u8,
}

impl RuleSpec {
    /// Validates the candidate and returns it unchanged on success.
    ///
    /// Structural checks (field ranges, set sanity) run first and fail with
    /// [`RuleError::InvalidField`]; cross-field checks follow and fail with
    /// [`RuleError::SemanticConflict`]. The first violation aborts.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Same as [`validated`](Self::validated) for a borrowed candidate.
    pub fn validate(&self) -> Result<()> {
        self.validate_structure()?;
        self.validate_semantics()
    }

    fn validate_structure(&self) -> Result<()> {
        if self.on_hour > 23 {
            return Err(RuleError::invalid_field(
                "on_hour",
                format!("{} is out of range 0..=23", self.on_hour),
            ));
        }

        if self.repeat == Some(0) {
            return Err(RuleError::invalid_field("repeat", "repeat count must be at least 1"));
        }

        let start = self.start_wall();
        if start.minute() != 0 || start.second() != 0 || start.nanosecond() != 0 {
            return Err(RuleError::invalid_field(
                "start",
                "start must be aligned to a whole hour",
            ));
        }

        if let Some(end) = self.end_wall() {
            if end.minute() != 0 || end.second() != 0 || end.nanosecond() != 0 {
                return Err(RuleError::invalid_field(
                    "end",
                    "end must be aligned to a whole hour",
                ));
            }
        }

        validate_month_set("except_months", self.except_months.as_ref())?;

        match &self.kind {
            KindSpec::Daily(daily) => {
                if daily.every_nth_day == 0 || daily.every_nth_day > 365 {
                    return Err(RuleError::invalid_field(
                        "every_nth_day",
                        format!("{} is out of range 1..=365", daily.every_nth_day),
                    ));
                }
                validate_day_set("except_days", daily.except_days.as_ref())?;
            }
            KindSpec::Weekly(weekly) => {
                if weekly.every_nth_week == 0 || weekly.every_nth_week > 53 {
                    return Err(RuleError::invalid_field(
                        "every_nth_week",
                        format!("{} is out of range 1..=53", weekly.every_nth_week),
                    ));
                }
                validate_day_set("on_days", Some(&weekly.on_days))?;
            }
            KindSpec::Monthly(monthly) => {
                if let Some(rule) = &monthly.day_of_month_rule {
                    if rule.day == 0 || rule.day > 31 {
                        return Err(RuleError::invalid_field(
                            "day_of_month_rule.day",
                            format!("{} is out of range 1..=31", rule.day),
                        ));
                    }
                    if rule.every_nth == 0 || rule.every_nth > 12 {
                        return Err(RuleError::invalid_field(
                            "day_of_month_rule.every_nth",
                            format!("{} is out of range 1..=12", rule.every_nth),
                        ));
                    }
                }
                if let Some(rule) = &monthly.weekday_rule {
                    if rule.count == 0 || rule.count > 5 {
                        return Err(RuleError::invalid_field(
                            "weekday_rule.count",
                            format!("{} is out of range 1..=5", rule.count),
                        ));
                    }
                    if rule.weekday > 6 {
                        return Err(RuleError::invalid_field(
                            "weekday_rule.weekday",
                            format!("{} is out of range 0..=6", rule.weekday),
                        ));
                    }
                    if rule.every_nth == 0 || rule.every_nth > 12 {
                        return Err(RuleError::invalid_field(
                            "weekday_rule.every_nth",
                            format!("{} is out of range 1..=12", rule.every_nth),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_semantics(&self) -> Result<()> {
        if let Some(end) = self.end {
            if end <= self.start {
                return Err(RuleError::conflict(format!(
                    "end date ({end}) must be absent or after start date ({})",
                    self.start
                )));
            }
        }

        if self.end.is_some() && self.repeat.is_some() {
            return Err(RuleError::conflict(
                "an end date and a repeat count may not both be set",
            ));
        }

        let start = self.start_wall();

        if let Some(months) = &self.except_months {
            if months.len() >= 12 {
                return Err(RuleError::conflict("may not except every month of the year"));
            }
            if months.contains(&(start.month() as u8)) {
                return Err(RuleError::conflict("may not except the month of the start date"));
            }
        }

        match &self.kind {
            KindSpec::Daily(daily) => {
                if let Some(days) = &daily.except_days {
                    if days.len() >= 7 {
                        return Err(RuleError::conflict("may not except every day of the week"));
                    }
                    if days.contains(&(start.weekday().num_days_from_monday() as u8)) {
                        return Err(RuleError::conflict("may not except the weekday of the start date"));
                    }
                }
            }
            KindSpec::Weekly(weekly) => {
                if weekly.on_days.is_empty() {
                    return Err(RuleError::conflict("a weekly rule needs at least one weekday"));
                }
            }
            KindSpec::Monthly(monthly) => {
                if monthly.day_of_month_rule.is_some() == monthly.weekday_rule.is_some() {
                    return Err(RuleError::conflict(
                        "a monthly rule needs exactly one of day_of_month_rule and weekday_rule",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Start instant as a wall clock in the rule timezone.
    pub(crate) fn start_wall(&self) -> NaiveDateTime {
        self.start.with_timezone(&self.timezone).naive_local()
    }

    /// End instant as a wall clock in the rule timezone.
    pub(crate) fn end_wall(&self) -> Option<NaiveDateTime> {
        self.end.map(|end| end.with_timezone(&self.timezone).naive_local())
    }

    /// `true` when the rule has neither an end date nor a repeat count.
    pub fn is_unbounded(&self) -> bool {
        self.end.is_none() && self.repeat.is_none()
    }
}

// Timestamps always serialize with a numeric offset ("+00:00", never "Z"),
// independent of the chrono version in the build. Deserialization stays
// permissive and accepts both forms.
fn serialize_instant<S: Serializer>(at: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, false))
}

fn serialize_instant_opt<S: Serializer>(
    at: &Option<DateTime<FixedOffset>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serialize_instant(at, serializer),
        None => serializer.serialize_none(),
    }
}

fn validate_day_set(field: &'static str, days: Option<&BTreeSet<u8>>) -> Result<()> {
    let Some(days) = days else { return Ok(()) };

    if days.is_empty() {
        return Err(RuleError::invalid_field(field, "set may not be empty; use null to clear"));
    }
    if let Some(invalid) = days.iter().find(|day| **day > SUNDAY) {
        return Err(RuleError::invalid_field(
            field,
            format!("{invalid} is not a weekday between 0 (Monday) and 6 (Sunday)"),
        ));
    }

    Ok(())
}

fn validate_month_set(field: &'static str, months: Option<&BTreeSet<u8>>) -> Result<()> {
    let Some(months) = months else { return Ok(()) };

    if months.is_empty() {
        return Err(RuleError::invalid_field(field, "set may not be empty; use null to clear"));
    }
    if let Some(invalid) = months.iter().find(|month| **month < JANUARY || **month > DECEMBER) {
        return Err(RuleError::invalid_field(
            field,
            format!("{invalid} is not a month between 1 (January) and 12 (December)"),
        ));
    }

    Ok(())
}
