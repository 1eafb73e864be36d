mod csv_file;
mod readings;
mod time_series;

#[cfg(test)]
mod fake;

pub use self::{
    csv_file::export_csv,
    readings::{Reading, fetch_readings},
    time_series::{Target, export_time_series},
};

use chrono::{DateTime, Utc};

use crate::{
    api::{ConsumptionData, Portal},
    core::{Channel, DayRange, civil_time::parse_api_timestamp},
    prelude::*,
    quantity::KilowattHours,
};

/// Fetch one week and flatten its valid values.
fn fetch_valid(
    portal: &impl Portal,
    installation_id: &str,
    data_type: &str,
    week: DayRange,
) -> Result<Vec<(DateTime<Utc>, Channel, KilowattHours)>> {
    let data = portal.consumption(installation_id, data_type, week)?;
    let values = valid_values(&data)?;
    info!(start = %week.start, end = %week.end, n_values = values.len(), "retrieved");
    Ok(values)
}

fn valid_values(data: &ConsumptionData) -> Result<Vec<(DateTime<Utc>, Channel, KilowattHours)>> {
    let mut values = Vec::new();
    for channel in Channel::ALL {
        for value in data.values(channel) {
            if let Some(energy) = value.valid() {
                values.push((parse_api_timestamp(value.timestamp)?, channel, energy));
            }
        }
    }
    Ok(values)
}
