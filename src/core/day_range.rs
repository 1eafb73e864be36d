use std::fmt::{Debug, Display, Formatter};

use chrono::{Days, NaiveDate};

use crate::{error::ExportError, prelude::*};

/// Calendar days from `start` to `end`, both inclusive.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Debug for DayRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

impl Display for DayRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

impl DayRange {
    /// The caller guarantees `start <= end`.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub const fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ExportError::Configuration(format!(
                "start date {start} is after end date {end}"
            ))
            .into());
        }
        Ok(Self { start, end })
    }

    /// Number of days between the bounds, i.e. zero for a single-day range.
    #[must_use]
    pub fn span_days(self) -> i64 {
        (self.end - self.start).num_days()
    }

    #[must_use]
    pub fn contains(self, day: NaiveDate) -> bool {
        (self.start <= day) && (day <= self.end)
    }

    /// Grow the range by `day` if it is already covered or directly follows `end`.
    ///
    /// Returns `false` and leaves the range untouched otherwise.
    pub fn append_consecutive(&mut self, day: NaiveDate) -> bool {
        if self.contains(day) {
            return true;
        }
        if self.end.checked_add_days(Days::new(1)) == Some(day) {
            self.end = day;
            return true;
        }
        false
    }
}

#[cfg(test)]
pub fn range(start: &str, end: &str) -> DayRange {
    DayRange::new(start.parse().unwrap(), end.parse().unwrap())
}
