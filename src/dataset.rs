//! Semicolon-separated consumption dataset, formatted like the portal's own CSV export.
//!
//! ```text
//! sep=;
//! Zeitraum;HT [kWh];NT [kWh]
//! 29.10.2023 02:00;0.25;
//! ```

use std::{fs, io, path::Path};

use crate::{
    core::{
        Datapoint,
        DayRange,
        DayRangeSet,
        civil_time::{format_local, local_day, resolve_sequence},
    },
    error::ExportError,
    prelude::*,
    quantity::KilowattHours,
};

const SEPARATOR_HINT: &str = "sep=;";
const HEADER: &str = "Zeitraum;HT [kWh];NT [kWh]";

/// Read the dataset; a missing file is an empty dataset.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read(path: &Path) -> Result<Vec<Datapoint>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!("no dataset yet");
            return Ok(Vec::new());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read `{}`", path.display()));
        }
    };
    let datapoints = parse(&contents).map_err(|error| ExportError::MalformedData {
        path: path.to_path_buf(),
        reason: format!("{error:#}"),
    })?;
    info!(n_datapoints = datapoints.len(), "read");
    Ok(datapoints)
}

/// Replace the dataset with the rendered `datapoints`.
#[instrument(skip_all, fields(path = %path.display(), n_datapoints = datapoints.len()))]
pub fn write(path: &Path, datapoints: &[Datapoint]) -> Result {
    let contents = render(datapoints)?;
    fs::write(path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
    info!("written");
    Ok(())
}

pub fn parse(contents: &str) -> Result<Vec<Datapoint>> {
    let mut lines = contents.lines();
    ensure!(
        lines.next().map(str::trim) == Some(SEPARATOR_HINT),
        "expected the file to start with `{SEPARATOR_HINT}`"
    );
    ensure!(lines.next().map(str::trim) == Some(HEADER), "expected the header `{HEADER}`");

    let body = lines.collect::<Vec<_>>().join("\n");
    let records = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_reader(body.as_bytes())
        .into_records()
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read the records")?;

    resolve_sequence(records, |record| record.get(0).unwrap_or_default())
        .map(|resolved| {
            let (instant, record) = resolved?;
            Ok(Datapoint {
                instant,
                high: parse_value(record.get(1))?,
                low: parse_value(record.get(2))?,
            })
        })
        .collect()
}

fn parse_value(field: Option<&str>) -> Result<Option<KilowattHours>> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            Ok(Some(value.parse().with_context(|| format!("invalid value `{value}`"))?))
        }
    }
}

pub fn render(datapoints: &[Datapoint]) -> Result<String> {
    let mut buffer = format!("{SEPARATOR_HINT}\n{HEADER}\n").into_bytes();
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        for datapoint in datapoints {
            writer.write_record([
                format_local(datapoint.instant),
                datapoint.high.map(KilowattHours::to_plain_string).unwrap_or_default(),
                datapoint.low.map(KilowattHours::to_plain_string).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8(buffer)?)
}

/// Zurich days carrying at least one value.
pub fn present_ranges(datapoints: &[Datapoint]) -> DayRangeSet {
    let mut ranges: Vec<DayRange> = Vec::new();
    let days = datapoints
        .iter()
        .filter(|point| point.has_values())
        .map(|point| local_day(point.instant));
    for day in days {
        if !ranges
            .last_mut()
            .is_some_and(|range| range.append_consecutive(day))
        {
            ranges.push(DayRange::single(day));
        }
    }
    DayRangeSet::new(ranges)
}
