//! Computed occurrence series and their output representations.

use crate::utils;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::fmt::{Display, Formatter};

/// Representation occurrences are handed out in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// RFC 3339 string in UTC, e.g. `2014-01-04T02:15:00+00:00`.
    #[default]
    Iso,
    /// Seconds since the Unix epoch.
    Posix,
    /// Timezone-aware instant in the rule timezone.
    Zoned,
}

/// A single computed occurrence in one of the [`OutputFormat`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occurrence {
    /// RFC 3339 string in UTC.
    Iso(String),
    /// Seconds since the Unix epoch.
    Posix(i64),
    /// Instant in the rule timezone.
    Zoned(DateTime<Tz>),
}

impl Occurrence {
    /// Localizes a wall-clock instant and renders it in the requested format.
    pub(crate) fn emit(at: NaiveDateTime, timezone: Tz, format: OutputFormat) -> Self {
        let localized = utils::localize(timezone, at);
        match format {
            OutputFormat::Iso => Self::Iso(
                localized
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Secs, false),
            ),
            OutputFormat::Posix => Self::Posix(localized.timestamp()),
            OutputFormat::Zoned => Self::Zoned(localized),
        }
    }
}

impl Display for Occurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iso(iso) => f.write_str(iso),
            Self::Posix(seconds) => write!(f, "{seconds}"),
            Self::Zoned(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Secs, false)),
        }
    }
}

/// Ordered result of a [`compute`](crate::rule::Rule::compute) call.
///
/// Instants are stored as wall clocks in the rule timezone and localized
/// lazily, so one series can be read out in any format-compatible way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceSeries {
    instants: Vec<NaiveDateTime>,
    timezone: Tz,
    format: OutputFormat,
    infinite: bool,
}

impl OccurrenceSeries {
    pub(crate) fn new(
        instants: Vec<NaiveDateTime>,
        timezone: Tz,
        format: OutputFormat,
        infinite: bool,
    ) -> Self {
        Self {
            instants,
            timezone,
            format,
            infinite,
        }
    }

    /// Number of occurrences in the series.
    pub fn count(&self) -> usize {
        self.instants.len()
    }

    /// `true` when the series holds no occurrences.
    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// `true` when the rule behind the series has no end; the series then
    /// holds only the first batch of an endless sequence.
    pub fn infinite(&self) -> bool {
        self.infinite
    }

    /// Earliest occurrence, if any.
    pub fn first(&self) -> Option<Occurrence> {
        self.instants.first().map(|at| self.emit(*at))
    }

    /// Latest occurrence, if any.
    pub fn last(&self) -> Option<Occurrence> {
        self.instants.last().map(|at| self.emit(*at))
    }

    /// All occurrences in ascending order.
    pub fn all(&self) -> Vec<Occurrence> {
        self.instants.iter().map(|at| self.emit(*at)).collect()
    }

    /// Occurrences between `from` and `to`, both inclusive, compared as
    /// wall clocks in the rule timezone. An absent `to` means no upper bound.
    pub fn segment(&self, from: NaiveDateTime, to: Option<NaiveDateTime>) -> Vec<Occurrence> {
        self.instants
            .iter()
            .filter(|at| **at >= from && to.map_or(true, |to| **at <= to))
            .map(|at| self.emit(*at))
            .collect()
    }

    /// Raw wall-clock instants in the rule timezone.
    pub fn instants(&self) -> &[NaiveDateTime] {
        &self.instants
    }

    pub(crate) fn into_instants(self) -> Vec<NaiveDateTime> {
        self.instants
    }

    fn emit(&self, at: NaiveDateTime) -> Occurrence {
        Occurrence::emit(at, self.timezone, self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn series(format: OutputFormat) -> OccurrenceSeries {
        let instants = vec![
            dt("2014-01-01T08:00:00"),
            dt("2014-01-22T08:00:00"),
            dt("2014-01-31T08:00:00"),
            dt("2014-03-05T08:00:00"),
        ];
        OccurrenceSeries::new(instants, Tz::UTC, format, false)
    }

    #[rstest]
    #[case(Tz::UTC, "2014-01-01T08:00:00", "2014-01-01T08:00:00+00:00")]
    // Kathmandu is +05:45, so 08:00 on the wall is 02:15 in UTC.
    #[case(Tz::Asia__Kathmandu, "2014-01-04T08:00:00", "2014-01-04T02:15:00+00:00")]
    fn emit_iso_normalizes_to_utc(#[case] timezone: Tz, #[case] at: &str, #[case] expected: &str) {
        let occurrence = Occurrence::emit(dt(at), timezone, OutputFormat::Iso);
        assert_eq!(occurrence, Occurrence::Iso(expected.to_string()));
        assert_eq!(occurrence.to_string(), expected);
    }

    #[test]
    fn emit_posix() {
        let occurrence = Occurrence::emit(dt("2014-01-01T08:00:00"), Tz::UTC, OutputFormat::Posix);
        assert_eq!(occurrence, Occurrence::Posix(1_388_563_200));
        assert_eq!(occurrence.to_string(), "1388563200");
    }

    #[test]
    fn emit_zoned_keeps_wall_clock() {
        let occurrence = Occurrence::emit(
            dt("2014-01-01T08:00:00"),
            Tz::America__Chicago,
            OutputFormat::Zoned,
        );
        let Occurrence::Zoned(at) = &occurrence else {
            panic!("expected a zoned occurrence");
        };
        assert_eq!(at.naive_local(), dt("2014-01-01T08:00:00"));
        assert_eq!(occurrence.to_string(), "2014-01-01T08:00:00-06:00");
    }

    #[test]
    fn first_last_count() {
        let series = series(OutputFormat::Iso);
        assert_eq!(series.count(), 4);
        assert!(!series.is_empty());
        assert!(!series.infinite());
        assert_eq!(series.first(), Some(Occurrence::Iso("2014-01-01T08:00:00+00:00".into())));
        assert_eq!(series.last(), Some(Occurrence::Iso("2014-03-05T08:00:00+00:00".into())));
    }

    #[test]
    fn empty_series() {
        let series = OccurrenceSeries::new(Vec::new(), Tz::UTC, OutputFormat::Iso, false);
        assert!(series.is_empty());
        assert_eq!(series.first(), None);
        assert_eq!(series.last(), None);
        assert!(series.all().is_empty());
    }

    #[rstest]
    #[case("2014-01-31T00:00:00", None, 2)]
    #[case("2014-03-06T00:00:00", None, 0)]
    #[case("2014-01-01T08:00:00", None, 4)] // bounds are inclusive
    #[case("2014-01-20T00:00:00", Some("2014-03-05T08:00:00"), 3)]
    #[case("2014-01-20T00:00:00", Some("2014-03-04T00:00:00"), 2)]
    fn segment_bounds(#[case] from: &str, #[case] to: Option<&str>, #[case] expected: usize) {
        let series = series(OutputFormat::Iso);
        assert_eq!(series.segment(dt(from), to.map(dt)).len(), expected);
    }
}
