use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{DateTime, Utc};

use crate::{
    core::datapoint::{Channel, Datapoint},
    quantity::KilowattHours,
};

/// Freshly retrieved datapoints keyed by instant.
#[must_use]
#[derive(Default)]
pub struct FreshPoints(BTreeMap<DateTime<Utc>, Datapoint>);

impl FreshPoints {
    /// Overlay the channel value onto the datapoint at the instant, creating it if needed.
    pub fn overlay(&mut self, instant: DateTime<Utc>, channel: Channel, value: KilowattHours) {
        self.0.entry(instant).or_insert_with(|| Datapoint::empty(instant)).set(channel, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge into the chronologically ordered `existing` series, fresh values winning.
    ///
    /// Returns [`None`] when there is nothing fresh to merge.
    #[must_use]
    pub fn merge_into(self, existing: Vec<Datapoint>) -> Option<Vec<Datapoint>> {
        if self.is_empty() {
            return None;
        }

        let mut merged = Vec::with_capacity(existing.len() + self.0.len());
        let mut fresh = self.0.into_values().peekable();
        for point in existing {
            while let Some(next) = fresh.next_if(|next| next.instant < point.instant) {
                merged.push(next);
            }
            match fresh.peek().map(|next| next.instant.cmp(&point.instant)) {
                Some(Ordering::Equal) => merged.extend(fresh.next()),
                _ => merged.push(point),
            }
        }
        merged.extend(fresh);
        Some(merged)
    }
}
