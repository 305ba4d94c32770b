//! Recurrence rule builder and occurrence computation entry point.

use crate::{
    cursor::OccurrenceCursor,
    engine::Engine,
    error::RuleError,
    result::{OccurrenceSeries, OutputFormat},
    spec::{
        DailySpec, DayOfMonthRule, KindSpec, MonthlySpec, RuleSpec, WeekdayRule, WeeklySpec,
    },
    utils, Result,
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use std::collections::BTreeSet;

/// A validated recurrence rule.
///
/// A rule always wraps a spec that passed validation: every mutator clones
/// the spec, applies its change, re-validates and only then swaps the new
/// spec in, so a failed call leaves the rule untouched. Mutators return
/// `&mut Self` and can be chained:
///
/// ```
/// use chrono::NaiveDate;
/// use chrono_tz::Tz;
/// use recur_lite::{Rule, FEBRUARY};
///
/// # fn main() -> recur_lite::Result<()> {
/// let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
/// let mut rule = Rule::daily(start, Tz::UTC)?;
/// rule.every_nth_day(3)?.except_months(Some(&[FEBRUARY]))?.on_hour(8)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    spec: RuleSpec,
}

impl Rule {
    /// Creates a rule firing every day at midnight, starting on `start`.
    pub fn daily(start: NaiveDate, timezone: Tz) -> Result<Self> {
        Self::with_kind(
            start,
            timezone,
            KindSpec::Daily(DailySpec {
                every_nth_day: 1,
                except_days: None,
            }),
        )
    }

    /// Creates a rule firing on the given weekdays (Monday = 0) of every week.
    pub fn weekly(start: NaiveDate, timezone: Tz, on_days: &[u8]) -> Result<Self> {
        Self::with_kind(
            start,
            timezone,
            KindSpec::Weekly(WeeklySpec {
                every_nth_week: 1,
                on_days: on_days.iter().copied().collect(),
            }),
        )
    }

    /// Creates a rule firing on the given day number of every month.
    pub fn monthly_by_day(start: NaiveDate, timezone: Tz, day: u8) -> Result<Self> {
        Self::with_kind(
            start,
            timezone,
            KindSpec::Monthly(MonthlySpec {
                day_of_month_rule: Some(DayOfMonthRule { day, every_nth: 1 }),
                weekday_rule: None,
            }),
        )
    }

    /// Creates a rule firing on the N-th given weekday of every month,
    /// e.g. `count = 3, weekday = THURSDAY` for every third Thursday.
    pub fn monthly_by_weekday(start: NaiveDate, timezone: Tz, count: u8, weekday: u8) -> Result<Self> {
        Self::with_kind(
            start,
            timezone,
            KindSpec::Monthly(MonthlySpec {
                day_of_month_rule: None,
                weekday_rule: Some(WeekdayRule {
                    count,
                    weekday,
                    every_nth: 1,
                }),
            }),
        )
    }

    /// Wraps an externally built spec, typically one deserialized from JSON.
    pub fn from_spec(spec: RuleSpec) -> Result<Self> {
        Ok(Self {
            spec: spec.validated()?,
        })
    }

    fn with_kind(start: NaiveDate, timezone: Tz, kind: KindSpec) -> Result<Self> {
        let spec = RuleSpec {
            start: utils::localize(timezone, utils::at_hour(start, 0)).fixed_offset(),
            end: None,
            repeat: None,
            timezone,
            on_hour: 0,
            except_months: None,
            kind,
        };

        Ok(Self {
            spec: spec.validated()?,
        })
    }

    /// The validated spec behind the rule.
    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    /// Sets the day stride of a daily rule.
    pub fn every_nth_day(&mut self, every_nth_day: u16) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Daily(daily) => {
                daily.every_nth_day = every_nth_day;
                Ok(())
            }
            _ => Err(RuleError::conflict("every_nth_day applies to daily rules only")),
        })
    }

    /// Sets or clears the weekdays a daily rule skips.
    pub fn except_weekdays(&mut self, weekdays: Option<&[u8]>) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Daily(daily) => {
                daily.except_days = weekdays.map(|days| days.iter().copied().collect());
                Ok(())
            }
            _ => Err(RuleError::conflict("except_weekdays applies to daily rules only")),
        })
    }

    /// Sets the week stride of a weekly rule.
    pub fn every_nth_week(&mut self, every_nth_week: u8) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Weekly(weekly) => {
                weekly.every_nth_week = every_nth_week;
                Ok(())
            }
            _ => Err(RuleError::conflict("every_nth_week applies to weekly rules only")),
        })
    }

    /// Sets the weekdays a weekly rule fires on.
    pub fn on_days(&mut self, weekdays: &[u8]) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Weekly(weekly) => {
                weekly.on_days = weekdays.iter().copied().collect();
                Ok(())
            }
            _ => Err(RuleError::conflict("on_days applies to weekly rules only")),
        })
    }

    /// Switches a monthly rule to its fixed day-number form.
    pub fn day_of_month(&mut self, day: u8, every_nth: u8) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Monthly(monthly) => {
                monthly.day_of_month_rule = Some(DayOfMonthRule { day, every_nth });
                monthly.weekday_rule = None;
                Ok(())
            }
            _ => Err(RuleError::conflict("day_of_month applies to monthly rules only")),
        })
    }

    /// Switches a monthly rule to its counted weekday form.
    pub fn weekday_of_month(&mut self, count: u8, weekday: u8, every_nth: u8) -> Result<&mut Self> {
        self.commit(|spec| match &mut spec.kind {
            KindSpec::Monthly(monthly) => {
                monthly.weekday_rule = Some(WeekdayRule {
                    count,
                    weekday,
                    every_nth,
                });
                monthly.day_of_month_rule = None;
                Ok(())
            }
            _ => Err(RuleError::conflict("weekday_of_month applies to monthly rules only")),
        })
    }

    /// Sets or clears the months the rule never fires in.
    pub fn except_months(&mut self, months: Option<&[u8]>) -> Result<&mut Self> {
        self.commit(|spec| {
            spec.except_months = months.map(|months| months.iter().copied().collect::<BTreeSet<_>>());
            Ok(())
        })
    }

    /// Moves every occurrence, including the start, to the given hour of
    /// the day. An already stored end instant keeps its old hour.
    pub fn on_hour(&mut self, hour: u8) -> Result<&mut Self> {
        self.commit(|spec| {
            if hour > 23 {
                return Err(RuleError::invalid_field(
                    "on_hour",
                    format!("{hour} is out of range 0..=23"),
                ));
            }

            let start = utils::at_hour(spec.start_wall().date(), hour);
            spec.start = utils::localize(spec.timezone, start).fixed_offset();
            spec.on_hour = hour;
            Ok(())
        })
    }

    /// Lets the rule run through the whole of `date`: stores an exclusive
    /// end on the following day at the current `on_hour`. `None` clears
    /// the end.
    pub fn end_on(&mut self, date: Option<NaiveDate>) -> Result<&mut Self> {
        self.commit(|spec| {
            spec.end = date.map(|date| {
                let end = utils::at_hour(date + TimeDelta::days(1), spec.on_hour);
                utils::localize(spec.timezone, end).fixed_offset()
            });
            Ok(())
        })
    }

    /// Stores an exclusive end at exactly the given wall-clock instant.
    /// `None` clears the end.
    pub fn end_before(&mut self, at: Option<NaiveDateTime>) -> Result<&mut Self> {
        self.commit(|spec| {
            spec.end = at.map(|at| utils::localize(spec.timezone, at).fixed_offset());
            Ok(())
        })
    }

    /// Sets or clears the total occurrence count of the rule.
    pub fn repeat(&mut self, count: Option<u32>) -> Result<&mut Self> {
        self.commit(|spec| {
            spec.repeat = count;
            Ok(())
        })
    }

    /// Computes the occurrence series of the rule.
    ///
    /// `from` narrows the series to occurrences at or after that wall-clock
    /// instant in the rule timezone; an occurrence sitting exactly on `from`
    /// is included. For a rule without an end date or repeat count the
    /// series is endless, so `cap` must limit the batch; bounded rules
    /// ignore `cap`. A repeat-counted rule always counts its occurrences
    /// from the rule start, `from` only trims the front of the result.
    pub fn compute(
        &self,
        from: Option<NaiveDateTime>,
        cap: Option<usize>,
        format: OutputFormat,
    ) -> Result<OccurrenceSeries> {
        let engine = Engine::new(&self.spec);

        let (instants, infinite) = if let Some(end) = self.spec.end_wall() {
            (engine.bounded_by_end(from, end), false)
        } else if let Some(repeat) = self.spec.repeat {
            let mut instants = engine.bounded_by_count(repeat);
            if let Some(from) = from {
                instants.retain(|at| *at >= from);
            }
            (instants, false)
        } else {
            let cap = cap.ok_or(RuleError::UnboundedQuery)?;
            (engine.capped(from, cap), true)
        };

        Ok(OccurrenceSeries::new(
            instants,
            self.spec.timezone,
            format,
            infinite,
        ))
    }

    /// Iterates occurrences one at a time, fetching batches on demand.
    /// `from` optionally starts iteration at a later wall-clock instant.
    pub fn occurrences(&self, from: Option<NaiveDateTime>, format: OutputFormat) -> OccurrenceCursor<'_> {
        OccurrenceCursor::new(self, from, format)
    }

    fn commit(&mut self, mutate: impl FnOnce(&mut RuleSpec) -> Result<()>) -> Result<&mut Self> {
        let mut candidate = self.spec.clone();
        mutate(&mut candidate)?;
        candidate.validate()?;
        self.spec = candidate;
        Ok(self)
    }
}
