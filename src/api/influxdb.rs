//! [InfluxDB v2](https://docs.influxdata.com/influxdb/v2/api/) sink.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ureq::Agent;

use crate::{api::TimeSeriesSink, core::Channel, prelude::*, quantity::KilowattHours};

pub struct Api {
    client: Agent,
    url: String,
    token: String,
    org: String,
    bucket: String,

    /// Line-protocol records waiting for [`TimeSeriesSink::flush`].
    pending: Vec<String>,
}

impl Api {
    pub fn new(url: &str, token: String, org: String, bucket: String) -> Self {
        let client =
            Agent::config_builder().timeout_global(Some(Duration::from_secs(30))).build().into();
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
            org,
            bucket,
            pending: Vec::new(),
        }
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

impl TimeSeriesSink for Api {
    #[instrument(skip_all, fields(bucket = %self.bucket, measurement = measurement, field = field))]
    fn latest(&self, measurement: &str, field: &str) -> Result<Option<DateTime<Utc>>> {
        let query = format!(
            r#"from(bucket: "{}") |> range(start: 0, stop: now()) |> filter(fn: (r) => r["_measurement"] == "{}" and r["_field"] == "{}") |> tail(n: 1)"#,
            flux_string(&self.bucket),
            flux_string(measurement),
            flux_string(field),
        );
        let response = self
            .client
            .post(format!("{}/api/v2/query", self.url))
            .query("org", &self.org)
            .header("Authorization", self.authorization())
            .header("Accept", "application/csv")
            .header("Content-Type", "application/vnd.flux")
            .send(query.as_str())
            .context("failed to query the latest point")?
            .body_mut()
            .read_to_string()?;
        let latest = latest_time(&response)?;
        info!(?latest, "queried");
        Ok(latest)
    }

    fn write_point(
        &mut self,
        measurement: &str,
        field: &str,
        instant: DateTime<Utc>,
        value: KilowattHours,
        channel: Channel,
    ) -> Result {
        self.pending.push(format!(
            "{} {}={},niedertarif={} {}",
            escape(measurement, &[',', ' ']),
            escape(field, &[',', '=', ' ']),
            value.0,
            channel.is_low(),
            instant.timestamp(),
        ));
        Ok(())
    }

    #[instrument(skip_all, fields(bucket = %self.bucket, n_points = self.pending.len()))]
    fn flush(&mut self) -> Result {
        if self.pending.is_empty() {
            return Ok(());
        }
        let body = self.pending.join("\n");
        self.client
            .post(format!("{}/api/v2/write", self.url))
            .query("org", &self.org)
            .query("bucket", &self.bucket)
            .query("precision", "s")
            .header("Authorization", self.authorization())
            .header("Content-Type", "text/plain; charset=utf-8")
            .send(body.as_str())
            .context("failed to write the points")?;
        debug!("written");
        self.pending.clear();
        Ok(())
    }
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if special.contains(&character) {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

fn flux_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pick the latest `_time` out of an annotated CSV query response.
fn latest_time(response: &str) -> Result<Option<DateTime<Utc>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(response.as_bytes());
    let mut time_column = None;
    let mut latest = None;
    for record in reader.records() {
        let record = record.context("failed to read the query response")?;
        // Every table in the response starts with its own header row.
        if let Some(index) = record.iter().position(|column| column == "_time") {
            time_column = Some(index);
            continue;
        }
        let Some(time) = time_column.and_then(|index| record.get(index)) else {
            continue;
        };
        let Ok(time) = DateTime::parse_from_rfc3339(time) else {
            continue;
        };
        latest = latest.max(Some(time.to_utc()));
    }
    Ok(latest)
}
