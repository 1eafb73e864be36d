use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::{InstallationProperty, InstallationSelection},
    core::Channel,
    export::Reading,
};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(header);
    table
}

#[must_use]
pub fn build_contracts_table(selection: &InstallationSelection) -> Table {
    let mut table = new_table(vec!["Installation ID", "Address", "Move-in date", "Move-out date"]);
    for contract in &selection.contracts {
        let address = selection.address_of(contract).map_or_else(
            || Cell::new("unknown").add_attribute(Attribute::Dim),
            |address| {
                Cell::new(format!(
                    "{} {}, {} {}",
                    address.street, address.house_number, address.postal_code, address.city,
                ))
            },
        );
        table.add_row(vec![
            Cell::new(&contract.installation_id).add_attribute(Attribute::Bold),
            address,
            Cell::new(&contract.move_in),
            contract.move_out.as_ref().map_or_else(
                || Cell::new("active").fg(Color::Green),
                |move_out| Cell::new(move_out).add_attribute(Attribute::Dim),
            ),
        ]);
    }
    table
}

#[must_use]
pub fn build_properties_table(properties: &[InstallationProperty]) -> Table {
    let mut table = new_table(vec!["Property", "From", "Until"]);
    for property in properties {
        table.add_row(vec![
            Cell::new(&property.property),
            Cell::new(property.from.as_deref().unwrap_or("–")),
            Cell::new(property.until.as_deref().unwrap_or("–")),
        ]);
    }
    table
}

#[must_use]
pub fn build_readings_table(readings: &[Reading]) -> Table {
    let mut table = new_table(vec!["Time", "kWh", "Tariff", "Status"]);
    for reading in readings {
        let is_valid = reading.status == "VALID";
        table.add_row(vec![
            Cell::new(&reading.label),
            reading.value.map_or_else(
                || Cell::new("–").add_attribute(Attribute::Dim),
                |value| Cell::new(value.0).set_alignment(CellAlignment::Right),
            ),
            Cell::new(reading.channel).fg(match reading.channel {
                Channel::High => Color::DarkYellow,
                Channel::Low => Color::Blue,
            }),
            Cell::new(&reading.status).fg(if is_valid { Color::Green } else { Color::Red }),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn contracts_table_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{
            "contracts": [{"anlage": "1000", "vstelle": "V1", "einzdat": "2020-01-01", "auszdat": null}],
            "evbs": [
                {
                    "vstelle": "V1",
                    "address": {"street": "Bahnhofstrasse", "houseNumber": "1", "postalCode": "8001", "city": "Zürich"}
                }
            ]
        }"#;
        let table = build_contracts_table(&serde_json::from_str(RESPONSE)?).to_string();
        assert!(table.contains("Bahnhofstrasse 1, 8001 Zürich"));
        assert!(table.contains("active"));
        Ok(())
    }
}
