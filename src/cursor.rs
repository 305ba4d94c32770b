//! Lazy, batch-refilling iteration over rule occurrences.

use crate::{
    result::{Occurrence, OccurrenceSeries, OutputFormat},
    rule::Rule,
};
use chrono::{NaiveDateTime, TimeDelta};

/// Occurrences fetched per refill of an [`OccurrenceCursor`] over an
/// unbounded rule.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Iterator over all occurrences of a rule, in ascending order.
///
/// Bounded rules are computed once and drained. Unbounded rules are walked
/// in batches: after draining one batch the cursor resumes computation from
/// the day after the last produced occurrence, so iteration never ends on
/// its own and should be limited by the caller.
pub struct OccurrenceCursor<'a> {
    rule: &'a Rule,
    format: OutputFormat,
    batch_size: usize,
    pending: std::vec::IntoIter<NaiveDateTime>,
    resume: Option<NaiveDateTime>,
    done: bool,
}

impl<'a> OccurrenceCursor<'a> {
    pub(crate) fn new(rule: &'a Rule, from: Option<NaiveDateTime>, format: OutputFormat) -> Self {
        Self {
            rule,
            format,
            batch_size: DEFAULT_BATCH_SIZE,
            pending: Vec::new().into_iter(),
            resume: from,
            done: false,
        }
    }

    /// Overrides the refill batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn refill(&mut self) {
        if self.rule.spec().is_unbounded() {
            // The cap is always present here, so compute cannot fail.
            let instants = self
                .rule
                .compute(self.resume, Some(self.batch_size), self.format)
                .map(OccurrenceSeries::into_instants)
                .unwrap_or_default();
            // A short batch means the walk gave up; there is nothing beyond it.
            self.done = instants.len() < self.batch_size;
            self.pending = instants.into_iter();
        } else {
            let instants = self
                .rule
                .compute(self.resume, None, self.format)
                .map(OccurrenceSeries::into_instants)
                .unwrap_or_default();
            self.done = true;
            self.pending = instants.into_iter();
        }
    }
}

impl Iterator for OccurrenceCursor<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(at) = self.pending.next() {
                // Resuming from the next day cannot skip anything: a rule
                // fires at most once per day.
                self.resume = Some(at + TimeDelta::days(1));
                return Some(Occurrence::emit(
                    at,
                    self.rule.spec().timezone,
                    self.format,
                ));
            }

            if self.done {
                return None;
            }
            self.refill();
        }
    }
}
