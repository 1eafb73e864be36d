//! Zurich civil time.
//!
//! The portal and the CSV dataset carry local wall-clock timestamps, so the hour repeated at the
//! autumn transition can only be told apart by the order in which the timestamps arrive.

use chrono::{DateTime, MappedLocalTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::{Europe::Zurich, Tz};

use crate::prelude::*;

pub const LOCAL_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse either `YYYY-MM-DD` or `DD.MM.YYYY`.
pub fn parse_day(day: &str) -> Result<NaiveDate> {
    let format = if day.contains('.') { "%d.%m.%Y" } else { "%Y-%m-%d" };
    NaiveDate::parse_from_str(day.trim(), format).with_context(|| format!("invalid day `{day}`"))
}

/// Format a day the way the portal API expects it.
#[must_use]
pub fn format_api_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse the portal's `YYYYMMDDHHMMSS` UTC timestamp.
pub fn parse_api_timestamp(timestamp: u64) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&timestamp.to_string(), "%Y%m%d%H%M%S")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("invalid API timestamp `{timestamp}`"))
}

#[must_use]
pub fn format_local(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Zurich).format(LOCAL_FORMAT).to_string()
}

#[must_use]
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Zurich).date_naive()
}

#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&Zurich).date_naive()
}

/// Both readings of a local time.
#[derive(Copy, Clone)]
struct Interpretations {
    first: DateTime<Utc>,
    second: DateTime<Utc>,
}

impl Interpretations {
    fn of(naive: NaiveDateTime) -> Self {
        match Zurich.from_local_datetime(&naive) {
            MappedLocalTime::Single(instant) => Self::same(instant.to_utc()),
            MappedLocalTime::Ambiguous(first, second) => {
                Self { first: first.to_utc(), second: second.to_utc() }
            }
            // Spring-forward gap: use the offset in effect before the transition.
            MappedLocalTime::None => Self::same(Self::before_gap(naive)),
        }
    }

    const fn same(instant: DateTime<Utc>) -> Self {
        Self { first: instant, second: instant }
    }

    fn before_gap(naive: NaiveDateTime) -> DateTime<Utc> {
        let an_hour = TimeDelta::hours(1);
        let earlier = naive - an_hour;
        Zurich.from_local_datetime(&earlier).earliest().map_or_else(
            || naive.and_utc(),
            |instant: DateTime<Tz>| instant.to_utc() + an_hour,
        )
    }

    fn is_ambiguous(self) -> bool {
        self.first != self.second
    }
}

/// Resolves ordered local timestamps into instants, tracking the repeated autumn hour.
///
/// Input must arrive in true chronological order; out-of-order input outside of the
/// repeated hour is resolved naively and may be misplaced.
#[derive(Clone)]
pub struct CivilTimeResolver {
    in_fold: bool,
    previous: DateTime<Utc>,
}

impl Default for CivilTimeResolver {
    fn default() -> Self {
        Self { in_fold: false, previous: DateTime::UNIX_EPOCH }
    }
}

impl CivilTimeResolver {
    pub fn resolve(&mut self, local: &str) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(local.trim(), LOCAL_FORMAT)
            .with_context(|| format!("invalid local time `{local}`"))?;
        Ok(self.resolve_naive(naive))
    }

    pub fn resolve_naive(&mut self, naive: NaiveDateTime) -> DateTime<Utc> {
        let interpretations = Interpretations::of(naive);
        let instant = if self.in_fold {
            if interpretations.is_ambiguous() {
                interpretations.second
            } else {
                self.in_fold = false;
                interpretations.first
            }
        } else if interpretations.first < self.previous && interpretations.is_ambiguous() {
            self.in_fold = true;
            interpretations.second
        } else {
            interpretations.first
        };
        self.previous = instant;
        instant
    }
}

/// Pair every item with its resolved instant, lazily.
pub fn resolve_sequence<I, T, K>(
    items: I,
    key: K,
) -> impl Iterator<Item = Result<(DateTime<Utc>, T)>>
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> &str,
{
    let mut resolver = CivilTimeResolver::default();
    items.into_iter().map(move |item| {
        let instant = resolver.resolve(key(&item))?;
        Ok((instant, item))
    })
}
