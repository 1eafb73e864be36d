use chrono::{Days, NaiveDate};

use crate::{
    api::InstallationProperty,
    core::{civil_time::parse_day, day_range::DayRange, day_range_set::DayRangeSet},
    error::ExportError,
    prelude::*,
};

pub const HIGH_RESOLUTION_TYPE: &str = "PK_VERB_15MIN";
pub const DAILY_TYPE: &str = "PK_VERB_TAG_EDM";

/// What the user asked for; everything is optional except the week limit.
#[must_use]
#[derive(Clone, Debug, bon::Builder)]
pub struct SelectionRequest {
    pub data_type: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,

    #[builder(default = 4)]
    pub limit: usize,
}

/// Requested data window resolved against what the installation reports.
///
/// Built once, right after the installation properties are fetched.
#[must_use]
#[derive(Clone, Debug)]
pub struct DataSelection {
    pub data_type: String,
    pub property_key: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub is_explicit: bool,
    pub available_ranges: DayRangeSet,
    pub requested_ranges: DayRangeSet,
    pub limit: usize,
}

impl DataSelection {
    pub fn new(
        properties: &[InstallationProperty],
        request: SelectionRequest,
        today: NaiveDate,
    ) -> Result<Self> {
        let data_type = request.data_type.unwrap_or_else(|| {
            let high_resolution_key = property_key(HIGH_RESOLUTION_TYPE);
            if properties.iter().any(|property| property.property == high_resolution_key) {
                HIGH_RESOLUTION_TYPE.to_string()
            } else {
                DAILY_TYPE.to_string()
            }
        });
        let property_key = property_key(&data_type).to_string();
        let windows: Vec<&InstallationProperty> =
            properties.iter().filter(|property| property.property == property_key).collect();

        let to = match request.to {
            Some(to) => to,
            None => match windows.last().and_then(|window| window.until.as_deref()) {
                Some(until) => parse_day(until)?,
                None => today,
            },
        };
        let from = request.from.unwrap_or_else(|| to - Days::new(7));
        let is_explicit = request.from.is_some() || request.to.is_some();

        let available_ranges = windows
            .iter()
            .filter_map(|window| match window.to_day_range(today) {
                Ok(range) => Some(range),
                Err(error) => {
                    warn!(property = %window.property, "skipping the validity window: {error:#}");
                    None
                }
            })
            .collect::<DayRangeSet>();

        let requested_ranges = if is_explicit {
            DayRangeSet::new(vec![DayRange::try_new(from, to)?])
        } else if available_ranges.is_empty() {
            return Err(ExportError::Configuration(format!(
                "the installation reports no data for `{property_key}`"
            ))
            .into());
        } else {
            available_ranges.clone()
        };

        debug!(%data_type, %from, %to, %requested_ranges, "resolved the data selection");
        Ok(Self {
            data_type,
            property_key,
            from,
            to,
            is_explicit,
            available_ranges,
            requested_ranges,
            limit: request.limit,
        })
    }

    /// Ranges to fetch one by one: a short request as is, otherwise up to `limit` whole weeks.
    #[must_use]
    pub fn requested_weeks(&self) -> Vec<DayRange> {
        match self.requested_ranges.single() {
            Some(range) if range.span_days() <= 7 => vec![range],
            _ => self.requested_ranges.covering_weeks().take(self.limit).collect(),
        }
    }
}

/// The portal names the properties like the data types, without the `PK_` prefix.
fn property_key(data_type: &str) -> &str {
    data_type.strip_prefix("PK_").unwrap_or(data_type)
}

impl InstallationProperty {
    /// The validity window as a day range; a missing end means «until today».
    fn to_day_range(&self, today: NaiveDate) -> Result<DayRange> {
        let start = parse_day(self.from.as_deref().context("the window has no start")?)?;
        let end = self.until.as_deref().map(parse_day).transpose()?.unwrap_or(today);
        if start > end {
            bail!("window starts ({start}) after it ends ({end})");
        }
        Ok(DayRange::new(start, end))
    }
}
