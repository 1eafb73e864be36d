pub mod ekz;
pub mod influxdb;
mod portal;
mod sink;

pub use self::{
    portal::{ConsumptionData, InstallationProperty, InstallationSelection, Portal},
    sink::TimeSeriesSink,
};
