pub mod civil_time;
mod datapoint;
mod day_range;
mod day_range_set;
mod merge;
mod selection;

#[cfg(test)]
pub use self::day_range::range;
pub use self::{
    datapoint::{Channel, Datapoint},
    day_range::DayRange,
    day_range_set::DayRangeSet,
    merge::FreshPoints,
    selection::{DataSelection, SelectionRequest},
};
