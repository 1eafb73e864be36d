use std::{
    fmt::{Debug, Display, Formatter},
    slice,
};

use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;

use crate::core::day_range::DayRange;

/// Sorted ranges that neither overlap nor touch each other.
///
/// The constructor is the only way in, so every set, including the results of
/// [`DayRangeSet::intersect`] and [`DayRangeSet::subtract`], is normalized.
#[must_use]
#[derive(Clone, Default, Eq, PartialEq)]
pub struct DayRangeSet(Vec<DayRange>);

impl Debug for DayRangeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.0).finish()
    }
}

impl Display for DayRangeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", self.0.iter().join(", "))
        }
    }
}

impl FromIterator<DayRange> for DayRangeSet {
    fn from_iter<T: IntoIterator<Item = DayRange>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl DayRangeSet {
    /// Sort the ranges and merge the overlapping and adjacent ones.
    pub fn new(mut ranges: Vec<DayRange>) -> Self {
        ranges.sort_unstable_by_key(|range| range.start);
        let mut normalized: Vec<DayRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            if let Some(current) = normalized.last_mut()
                && current.end.checked_add_days(Days::new(1)).is_none_or(|next| range.start <= next)
            {
                current.end = current.end.max(range.end);
            } else {
                normalized.push(range);
            }
        }
        Self(normalized)
    }

    #[cfg(test)]
    pub fn ranges(&self) -> &[DayRange] {
        &self.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The only range, if there is exactly one.
    #[must_use]
    pub fn single(&self) -> Option<DayRange> {
        match self.0.as_slice() {
            [range] => Some(*range),
            _ => None,
        }
    }

    /// Every covered day in ascending order.
    #[cfg(test)]
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0
            .iter()
            .flat_map(|range| range.start.iter_days().take_while(move |day| *day <= range.end))
    }

    /// Monday-to-Sunday weeks covering every day of the set, each emitted once.
    pub fn covering_weeks(&self) -> CoveringWeeks<'_> {
        CoveringWeeks { ranges: self.0.iter(), pending: None, last_monday: None }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while let (Some(ours), Some(theirs)) = (self.0.get(i), other.0.get(j)) {
            if ours.end < theirs.start {
                i += 1;
            } else if ours.start > theirs.end {
                j += 1;
            } else {
                ranges.push(DayRange::new(ours.start.max(theirs.start), ours.end.min(theirs.end)));
                // The range ending first is exhausted.
                if ours.end <= theirs.end {
                    i += 1;
                }
                if theirs.end <= ours.end {
                    j += 1;
                }
            }
        }
        Self::new(ranges)
    }

    pub fn subtract(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while let (Some(ours), Some(theirs)) = (self.0.get(i), other.0.get(j)) {
            if ours.end < theirs.start {
                ranges.push(*ours);
                i += 1;
            } else if ours.start > theirs.end {
                j += 1;
            } else {
                // `None` once the remainder runs past the end of the calendar.
                let mut remainder = Some(ours.start);
                for cut in other.0[j..].iter().take_while(|cut| cut.start <= ours.end) {
                    let Some(start) = remainder else { break };
                    if start < cut.start {
                        ranges.push(DayRange::new(start, cut.start - Days::new(1)));
                    }
                    remainder = cut.end.checked_add_days(Days::new(1));
                    if remainder.is_none_or(|start| start > ours.end) {
                        break;
                    }
                }
                if let Some(start) = remainder
                    && start <= ours.end
                {
                    ranges.push(DayRange::new(start, ours.end));
                }
                // The next range of ours may still overlap `other[j]`.
                i += 1;
            }
        }
        ranges.extend_from_slice(&self.0[i..]);
        Self::new(ranges)
    }
}

/// Lazy iterator behind [`DayRangeSet::covering_weeks`].
pub struct CoveringWeeks<'a> {
    ranges: slice::Iter<'a, DayRange>,

    /// Next Monday to emit and the end of the range being covered.
    pending: Option<(NaiveDate, NaiveDate)>,

    last_monday: Option<NaiveDate>,
}

impl Iterator for CoveringWeeks<'_> {
    type Item = DayRange;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((monday, end)) = self.pending {
                let sunday = monday + Days::new(6);
                self.last_monday = Some(monday);
                self.pending = (sunday < end).then(|| (monday + Days::new(7), end));
                return Some(DayRange::new(monday, sunday));
            }

            let range = self.ranges.next()?;
            let mut monday =
                range.start - Days::new(u64::from(range.start.weekday().num_days_from_monday()));
            if Some(monday) == self.last_monday {
                monday = monday + Days::new(7);
                if monday > range.end {
                    // Already covered by the previous week.
                    continue;
                }
            }
            self.pending = Some((monday, range.end));
        }
    }
}
