use chrono::NaiveDate;

use crate::{
    api::{Portal, TimeSeriesSink},
    core::{DataSelection, DayRange, DayRangeSet, civil_time::local_day},
    export::fetch_valid,
    prelude::*,
};

/// Where the points go in the time-series database.
#[derive(Clone, Debug)]
pub struct Target {
    pub measurement: String,
    pub field: String,
}

/// Write the selected weeks to the sink, resuming from the latest stored point.
#[instrument(
    skip_all,
    fields(installation_id = installation_id, measurement = %target.measurement),
)]
pub fn export_time_series(
    portal: &impl Portal,
    sink: &mut impl TimeSeriesSink,
    installation_id: &str,
    selection: &DataSelection,
    target: &Target,
    today: NaiveDate,
) -> Result {
    let ranges = match sink.latest(&target.measurement, &target.field)? {
        Some(latest) => {
            let since = local_day(latest);
            info!(%since, "resuming");
            if since > today {
                DayRangeSet::default()
            } else {
                selection
                    .requested_ranges
                    .intersect(&DayRangeSet::new(vec![DayRange::new(since, today)]))
            }
        }
        None => selection.requested_ranges.clone(),
    };

    let mut n_points = 0;
    for week in ranges.covering_weeks().take(selection.limit) {
        for (instant, channel, value) in
            fetch_valid(portal, installation_id, &selection.data_type, week)?
        {
            sink.write_point(&target.measurement, &target.field, instant, value, channel)?;
            n_points += 1;
        }
        sink.flush()?;
    }
    info!(n_points, "exported");
    Ok(())
}
