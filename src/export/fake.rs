use std::{cell::RefCell, collections::HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    api::{ConsumptionData, InstallationProperty, InstallationSelection, Portal, TimeSeriesSink},
    core::{Channel, DayRange},
    prelude::*,
    quantity::KilowattHours,
};

/// Portal serving canned weeks, keyed by their Monday.
#[derive(Default)]
pub struct FakePortal {
    weeks: HashMap<NaiveDate, String>,
    requested: RefCell<Vec<DayRange>>,
}

impl FakePortal {
    pub fn with_week(mut self, monday: &str, response: &str) -> Self {
        let monday = NaiveDate::parse_from_str(monday, "%Y-%m-%d").unwrap();
        self.weeks.insert(monday, response.to_string());
        self
    }

    pub fn requested_weeks(&self) -> Vec<DayRange> {
        self.requested.borrow().clone()
    }
}

impl Portal for FakePortal {
    fn installation_selection(&self) -> Result<InstallationSelection> {
        Ok(serde_json::from_str("{}")?)
    }

    fn installation_properties(&self, _installation_id: &str) -> Result<Vec<InstallationProperty>> {
        Ok(Vec::new())
    }

    fn consumption(
        &self,
        _installation_id: &str,
        _data_type: &str,
        range: DayRange,
    ) -> Result<ConsumptionData> {
        self.requested.borrow_mut().push(range);
        let response = self.weeks.get(&range.start).map_or("{}", String::as_str);
        Ok(serde_json::from_str(response)?)
    }
}

/// In-memory sink remembering what got flushed.
#[derive(Default)]
pub struct FakeSink {
    pub latest: Option<DateTime<Utc>>,
    pub pending: Vec<(DateTime<Utc>, Channel, KilowattHours)>,
    pub flushed: Vec<Vec<(DateTime<Utc>, Channel, KilowattHours)>>,
}

impl TimeSeriesSink for FakeSink {
    fn latest(&self, _measurement: &str, _field: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.latest)
    }

    fn write_point(
        &mut self,
        _measurement: &str,
        _field: &str,
        instant: DateTime<Utc>,
        value: KilowattHours,
        channel: Channel,
    ) -> Result {
        self.pending.push((instant, channel, value));
        Ok(())
    }

    fn flush(&mut self) -> Result {
        self.flushed.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}
