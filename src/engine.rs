//! Occurrence walking over a validated rule.
//!
//! All arithmetic in this module happens on the wall clock of the rule
//! timezone; instants are only localized at the output boundary. A [`Walk`]
//! yields candidate instants in ascending order, starting from the smallest
//! candidate at or after the requested floor. Resuming a walk from any
//! produced instant therefore yields that instant again as the first item.

use crate::{
    spec::{DailySpec, KindSpec, MonthlySpec, RuleSpec, WeeklySpec},
    utils,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Weekday};

/// Consecutive rejected candidates a walk tolerates before giving up.
/// Keeps walks over never-firing rules (say, the 30th of a February) finite.
pub(crate) const MAX_SEARCH_STEPS: usize = 10_000;

/// Stateless occurrence calculator borrowing a validated spec.
pub(crate) struct Engine<'a> {
    spec: &'a RuleSpec,
}

/// Walk position, advanced one candidate at a time.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Daily and weekly rules step over dates.
    Date(NaiveDate),
    /// Monthly rules step over (year, month) pairs.
    Month(i32, u8),
}

/// Iterator over the occurrence instants of one rule, unbounded above.
pub(crate) struct Walk<'a> {
    spec: &'a RuleSpec,
    cursor: Cursor,
    floor: NaiveDateTime,
    misses: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(spec: &'a RuleSpec) -> Self {
        Self { spec }
    }

    /// First possible occurrence instant: the start date at `on_hour`.
    pub(crate) fn anchor(&self) -> NaiveDateTime {
        utils::at_hour(self.spec.start_wall().date(), self.spec.on_hour)
    }

    /// Walks occurrences at or after `from`, clamped to the anchor.
    pub(crate) fn walk_from(&self, from: Option<NaiveDateTime>) -> Walk<'a> {
        let anchor = self.anchor();
        let floor = from.map_or(anchor, |from| from.max(anchor));

        Walk {
            spec: self.spec,
            cursor: self.first_cursor(floor),
            floor,
            misses: 0,
        }
    }

    /// All occurrences at or after `from` and strictly before `end`.
    pub(crate) fn bounded_by_end(
        &self,
        from: Option<NaiveDateTime>,
        end: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        self.walk_from(from).take_while(|at| *at < end).collect()
    }

    /// The first `repeat` occurrences, counted from the rule start.
    pub(crate) fn bounded_by_count(&self, repeat: u32) -> Vec<NaiveDateTime> {
        self.walk_from(None).take(repeat as usize).collect()
    }

    /// At most `cap` occurrences at or after `from`.
    pub(crate) fn capped(&self, from: Option<NaiveDateTime>, cap: usize) -> Vec<NaiveDateTime> {
        self.walk_from(from).take(cap).collect()
    }

    /// Smallest stride-aligned position at or around `floor`.
    ///
    /// Daily strides count days from the start date. Weekly strides count
    /// whole weeks between the Mondays of the start week and the floor week,
    /// so the cursor may point a few days before the floor; the walk filters
    /// those out. Monthly strides count calendar months.
    fn first_cursor(&self, floor: NaiveDateTime) -> Cursor {
        let start = self.spec.start_wall().date();

        match &self.spec.kind {
            KindSpec::Daily(daily) => {
                let nth = i64::from(daily.every_nth_day);
                let delta = (floor.date() - start).num_days();
                let mut date = if delta <= 0 {
                    start
                } else {
                    // delta is positive here, so this rounds up to the next
                    // whole stride.
                    start + TimeDelta::days((delta + nth - 1) / nth * nth)
                };
                if utils::at_hour(date, self.spec.on_hour) < floor {
                    date += TimeDelta::days(nth);
                }

                Cursor::Date(date)
            }
            KindSpec::Weekly(weekly) => {
                let nth = i64::from(weekly.every_nth_week);
                let start_monday = utils::monday_of_week(start);
                let floor_monday = utils::monday_of_week(floor.date());
                let weeks = (floor_monday - start_monday).num_days() / 7;
                let date = if weeks <= 0 {
                    start
                } else {
                    let pad = (nth - weeks % nth) % nth;
                    floor_monday + TimeDelta::days(pad * 7)
                };

                Cursor::Date(date.max(start))
            }
            KindSpec::Monthly(monthly) => {
                let nth = i32::from(monthly_step(monthly));
                let elapsed = utils::months_between(start, floor.date());
                let (year, month) = if elapsed <= 0 {
                    (start.year(), start.month() as u8)
                } else {
                    let pad = (nth - elapsed % nth) % nth;
                    utils::add_months(start.year(), start.month() as u8, (elapsed + pad) as u32)
                };

                Cursor::Month(year, month)
            }
        }
    }
}

impl Walk<'_> {
    /// Lifts a date into an occurrence instant, unless it falls in an
    /// excepted month or before the floor.
    fn admit(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        let excepted = self
            .spec
            .except_months
            .as_ref()
            .is_some_and(|months| months.contains(&(date.month() as u8)));
        if excepted {
            return None;
        }

        let at = utils::at_hour(date, self.spec.on_hour);
        (at >= self.floor).then_some(at)
    }

    fn step_daily(&mut self, daily: &DailySpec, date: NaiveDate) -> Option<NaiveDateTime> {
        self.cursor = Cursor::Date(date + TimeDelta::days(i64::from(daily.every_nth_day)));

        let weekday = date.weekday().num_days_from_monday() as u8;
        let excepted = daily
            .except_days
            .as_ref()
            .is_some_and(|days| days.contains(&weekday));
        if excepted {
            return None;
        }

        self.admit(date)
    }

    fn step_weekly(&mut self, weekly: &WeeklySpec, date: NaiveDate) -> Option<NaiveDateTime> {
        // From the last day of an active week the next candidate lives on
        // the Monday of the next active week.
        let jump = if weekly.every_nth_week > 1 && date.weekday() == Weekday::Sun {
            7 * i64::from(weekly.every_nth_week) - 6
        } else {
            1
        };
        self.cursor = Cursor::Date(date + TimeDelta::days(jump));

        let weekday = date.weekday().num_days_from_monday() as u8;
        if !weekly.on_days.contains(&weekday) {
            return None;
        }

        self.admit(date)
    }

    fn step_monthly(&mut self, monthly: &MonthlySpec, year: i32, month: u8) -> Option<NaiveDateTime> {
        let (next_year, next_month) = utils::add_months(year, month, u32::from(monthly_step(monthly)));
        self.cursor = Cursor::Month(next_year, next_month);

        self.admit(resolve_month(monthly, year, month)?)
    }
}

impl Iterator for Walk<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        while self.misses < MAX_SEARCH_STEPS {
            let spec = self.spec;
            let hit = match (&spec.kind, self.cursor) {
                (KindSpec::Daily(daily), Cursor::Date(date)) => self.step_daily(daily, date),
                (KindSpec::Weekly(weekly), Cursor::Date(date)) => self.step_weekly(weekly, date),
                (KindSpec::Monthly(monthly), Cursor::Month(year, month)) => {
                    self.step_monthly(monthly, year, month)
                }
                _ => return None,
            };

            match hit {
                Some(at) => {
                    self.misses = 0;
                    return Some(at);
                }
                None => self.misses += 1,
            }
        }

        None
    }
}

/// Month stride of a monthly rule, taken from whichever sub-rule is set.
fn monthly_step(monthly: &MonthlySpec) -> u8 {
    monthly
        .day_of_month_rule
        .as_ref()
        .map(|rule| rule.every_nth)
        .or_else(|| monthly.weekday_rule.as_ref().map(|rule| rule.every_nth))
        .unwrap_or(1)
}

/// The day a monthly rule fires on within one month, or `None` when the
/// month has no such day and is skipped entirely.
fn resolve_month(monthly: &MonthlySpec, year: i32, month: u8) -> Option<NaiveDate> {
    let day = if let Some(rule) = &monthly.day_of_month_rule {
        (rule.day <= utils::days_in_month(year, month)).then_some(rule.day)
    } else if let Some(rule) = &monthly.weekday_rule {
        utils::nth_weekday(year, month, rule.weekday, rule.count)
    } else {
        None
    };

    day.and_then(|day| NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)))
}
