use chrono::{DateTime, Utc};

use crate::{
    api::Portal,
    core::{
        Channel,
        DataSelection,
        civil_time::{format_local, parse_api_timestamp},
    },
    prelude::*,
    quantity::KilowattHours,
};

/// One reported value as is, including the invalid ones.
#[derive(Clone, Debug)]
pub struct Reading {
    pub instant: DateTime<Utc>,

    /// Local date and time as the portal labels the value.
    pub label: String,

    pub value: Option<KilowattHours>,
    pub channel: Channel,
    pub status: String,
}

/// Fetch the requested weeks and flatten both channels in chronological order.
#[instrument(skip_all, fields(installation_id = installation_id))]
pub fn fetch_readings(
    portal: &impl Portal,
    installation_id: &str,
    selection: &DataSelection,
) -> Result<Vec<Reading>> {
    let mut readings = Vec::new();
    for week in selection.requested_weeks() {
        let data = portal.consumption(installation_id, &selection.data_type, week)?;
        // Low tariff first, so that it leads at equal timestamps.
        for channel in [Channel::Low, Channel::High] {
            for value in data.values(channel) {
                let instant = parse_api_timestamp(value.timestamp)?;
                let label = if value.date.is_empty() {
                    format_local(instant)
                } else {
                    format!("{} {}", value.date, value.time)
                };
                readings.push(Reading {
                    instant,
                    label,
                    value: value.value,
                    channel,
                    status: value.status.clone(),
                });
            }
        }
    }
    readings.sort_by_key(|reading| reading.instant);
    info!(n_readings = readings.len(), "fetched");
    Ok(readings)
}
