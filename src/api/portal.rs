use serde::Deserialize;
use serde_with::{DefaultOnNull, NoneAsEmptyString, serde_as};

use crate::{
    core::{Channel, DayRange},
    prelude::*,
    quantity::KilowattHours,
};

/// Consumption data source.
pub trait Portal {
    fn installation_selection(&self) -> Result<InstallationSelection>;

    fn installation_properties(&self, installation_id: &str) -> Result<Vec<InstallationProperty>>;

    /// Fetch the consumption series of `data_type` for the days of `range`.
    fn consumption(
        &self,
        installation_id: &str,
        data_type: &str,
        range: DayRange,
    ) -> Result<ConsumptionData>;
}

#[derive(Deserialize)]
pub struct InstallationSelection {
    #[serde(default)]
    pub contracts: Vec<Contract>,

    #[serde(default, rename = "evbs")]
    pub consumption_points: Vec<ConsumptionPoint>,
}

impl InstallationSelection {
    #[must_use]
    pub fn address_of(&self, contract: &Contract) -> Option<&Address> {
        self.consumption_points
            .iter()
            .find(|point| point.id == contract.consumption_point_id)
            .map(|point| &point.address)
    }
}

#[serde_as]
#[derive(Deserialize)]
pub struct Contract {
    #[serde(rename = "anlage")]
    pub installation_id: String,

    #[serde(rename = "vstelle")]
    pub consumption_point_id: String,

    #[serde(rename = "einzdat", default)]
    pub move_in: String,

    #[serde_as(as = "DefaultOnNull<NoneAsEmptyString>")]
    #[serde(rename = "auszdat", default)]
    pub move_out: Option<String>,
}

#[derive(Deserialize)]
pub struct ConsumptionPoint {
    #[serde(rename = "vstelle")]
    pub id: String,

    pub address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Deserialize)]
pub struct InstallationData {
    pub status: Vec<InstallationProperty>,
}

/// Validity window of one data property.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct InstallationProperty {
    pub property: String,

    #[serde_as(as = "DefaultOnNull<NoneAsEmptyString>")]
    #[serde(rename = "ab", default)]
    pub from: Option<String>,

    #[serde_as(as = "DefaultOnNull<NoneAsEmptyString>")]
    #[serde(rename = "bis", default)]
    pub until: Option<String>,
}

#[derive(Deserialize)]
pub struct ConsumptionData {
    #[serde(rename = "seriesHt", default)]
    pub high: Option<Series>,

    #[serde(rename = "seriesNt", default)]
    pub low: Option<Series>,
}

impl ConsumptionData {
    #[must_use]
    pub fn values(&self, channel: Channel) -> &[Value] {
        let series = match channel {
            Channel::High => self.high.as_ref(),
            Channel::Low => self.low.as_ref(),
        };
        series.map_or(&[], |series| series.values.as_slice())
    }
}

#[derive(Deserialize)]
pub struct Series {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Deserialize)]
pub struct Value {
    #[serde(default)]
    pub value: Option<KilowattHours>,

    /// `YYYYMMDDHHMMSS` in UTC.
    pub timestamp: u64,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub time: String,

    pub status: String,
}

impl Value {
    /// The value, if the portal marks it as usable.
    #[must_use]
    pub fn valid(&self) -> Option<KilowattHours> {
        self.value.filter(|_| self.status == "VALID")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_installation_data_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{
            "status": [
                {"property": "VERB_15MIN", "ab": "2021-03-01", "bis": "2024-02-25"},
                {"property": "VERB_TAG_EDM", "ab": "2019-01-01", "bis": ""},
                {"property": "ABRECHNUNG", "ab": null, "bis": null}
            ]
        }"#;
        let data = serde_json::from_str::<InstallationData>(RESPONSE)?;
        assert_eq!(data.status.len(), 3);
        assert_eq!(data.status[0].from.as_deref(), Some("2021-03-01"));
        assert_eq!(data.status[1].until, None);
        assert_eq!(data.status[2].from, None);
        Ok(())
    }

    #[test]
    fn deserialize_consumption_data_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{
            "series": null,
            "seriesHt": {
                "level": "V",
                "energyType": null,
                "sourceType": null,
                "tariffType": "HT",
                "ab": "2023-10-23",
                "bis": "2023-10-29",
                "values": [
                    {"value": 0.25, "timestamp": 20231023061500, "date": "23.10.2023", "time": "08:15", "status": "VALID"},
                    {"value": 0.0, "timestamp": 20231023063000, "date": "23.10.2023", "time": "08:30", "status": "NOT_AVAILABLE"}
                ]
            },
            "seriesNt": {
                "level": "V",
                "tariffType": "NT",
                "ab": "2023-10-23",
                "bis": "2023-10-29",
                "values": []
            }
        }"#;
        let data = serde_json::from_str::<ConsumptionData>(RESPONSE)?;
        let high = data.values(Channel::High);
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].valid(), Some(KilowattHours(0.25)));
        assert_eq!(high[1].valid(), None);
        assert!(data.values(Channel::Low).is_empty());
        Ok(())
    }

    #[test]
    fn address_lookup_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{
            "contracts": [
                {"anlage": "1000", "vstelle": "V1", "einzdat": "2020-01-01", "auszdat": null},
                {"anlage": "2000", "vstelle": "V9", "einzdat": "2021-01-01", "auszdat": ""}
            ],
            "eanl": [],
            "evbs": [
                {
                    "vstelle": "V1",
                    "address": {"street": "Bahnhofstrasse", "houseNumber": "1", "postalCode": "8001", "city": "Zürich"}
                }
            ],
            "fkkvkp": [],
            "commonData": null
        }"#;
        let selection = serde_json::from_str::<InstallationSelection>(RESPONSE)?;
        let address = selection.address_of(&selection.contracts[0]).unwrap();
        assert_eq!(address.city, "Zürich");
        assert!(selection.address_of(&selection.contracts[1]).is_none());
        assert_eq!(selection.contracts[1].move_out, None);
        Ok(())
    }
}
