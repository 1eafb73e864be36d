use chrono::{DateTime, Utc};

use crate::{core::Channel, prelude::*, quantity::KilowattHours};

/// Time-series database the consumption is exported to.
pub trait TimeSeriesSink {
    /// Timestamp of the most recent stored point, if any.
    fn latest(&self, measurement: &str, field: &str) -> Result<Option<DateTime<Utc>>>;

    fn write_point(
        &mut self,
        measurement: &str,
        field: &str,
        instant: DateTime<Utc>,
        value: KilowattHours,
        channel: Channel,
    ) -> Result;

    /// Make the written points durable.
    fn flush(&mut self) -> Result;
}
