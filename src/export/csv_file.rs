use std::path::Path;

use crate::{
    api::Portal,
    core::{DataSelection, FreshPoints},
    dataset,
    export::fetch_valid,
    prelude::*,
};

/// Top up the dataset at `path` with the weeks it is missing, at most `selection.limit` of them.
#[instrument(skip_all, fields(installation_id = installation_id, path = %path.display()))]
pub fn export_csv(
    portal: &impl Portal,
    installation_id: &str,
    selection: &DataSelection,
    path: &Path,
) -> Result {
    let existing = dataset::read(path)?;
    let missing = selection.requested_ranges.subtract(&dataset::present_ranges(&existing));
    debug!(%missing, "computed the missing ranges");

    let mut fresh = FreshPoints::default();
    for week in missing.covering_weeks().take(selection.limit) {
        for (instant, channel, value) in
            fetch_valid(portal, installation_id, &selection.data_type, week)?
        {
            fresh.overlay(instant, channel, value);
        }
    }

    let n_fresh = fresh.len();
    match fresh.merge_into(existing) {
        Some(merged) => {
            dataset::write(path, &merged)?;
            info!(n_fresh, n_total = merged.len(), "exported");
        }
        None => {
            info!("no new valid datapoints");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use chrono::NaiveDate;

    use super::*;
    use crate::{
        core::{SelectionRequest, range},
        export::fake::FakePortal,
    };

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            Self(std::env::temp_dir().join(format!("ekzexport-{}-{name}.csv", std::process::id())))
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    fn selection(from: &str, to: &str, limit: usize) -> Result<DataSelection> {
        DataSelection::new(
            &[],
            SelectionRequest::builder()
                .data_type("PK_VERB_15MIN".to_string())
                .from(NaiveDate::parse_from_str(from, "%Y-%m-%d")?)
                .to(NaiveDate::parse_from_str(to, "%Y-%m-%d")?)
                .limit(limit)
                .build(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
    }

    // language=JSON
    const WEEK_2: &str = r#"{
        "seriesHt": {"values": [
            {"value": 0.25, "timestamp": 20240108000000, "status": "VALID"},
            {"value": 9.0, "timestamp": 20240108001500, "status": "NOT_AVAILABLE"}
        ]},
        "seriesNt": {"values": [
            {"value": 0.5, "timestamp": 20240108000000, "status": "VALID"},
            {"value": 0.75, "timestamp": 20240114224500, "status": "VALID"}
        ]}
    }"#;

    #[test]
    fn export_fills_the_gap_ok() -> Result {
        let file = TempFile::new("gap");
        fs::write(
            &file.0,
            "sep=;\nZeitraum;HT [kWh];NT [kWh]\n01.01.2024 00:00;1.0;\n07.01.2024 23:45;;2.0\n",
        )?;
        let portal = FakePortal::default().with_week("2024-01-08", WEEK_2);

        export_csv(&portal, "1000", &selection("2024-01-01", "2024-01-14", 4)?, &file.0)?;

        assert_eq!(
            portal.requested_weeks(),
            [range("2024-01-01", "2024-01-07"), range("2024-01-08", "2024-01-14")]
        );
        assert_eq!(
            fs::read_to_string(&file.0)?,
            "\
sep=;
Zeitraum;HT [kWh];NT [kWh]
01.01.2024 00:00;1.0;
07.01.2024 23:45;;2.0
08.01.2024 01:00;0.25;0.5
14.01.2024 23:45;;0.75
"
        );
        Ok(())
    }

    #[test]
    fn export_respects_the_limit_ok() -> Result {
        let file = TempFile::new("limit");
        let portal = FakePortal::default();

        export_csv(&portal, "1000", &selection("2024-01-01", "2024-03-01", 2)?, &file.0)?;

        assert_eq!(
            portal.requested_weeks(),
            [range("2024-01-01", "2024-01-07"), range("2024-01-08", "2024-01-14")]
        );
        Ok(())
    }

    #[test]
    fn export_without_fresh_points_leaves_the_file_alone() -> Result {
        let file = TempFile::new("untouched");
        let portal = FakePortal::default();

        export_csv(&portal, "1000", &selection("2024-01-08", "2024-01-14", 4)?, &file.0)?;

        assert!(!file.0.exists());
        Ok(())
    }

    #[test]
    fn export_of_a_complete_range_fetches_nothing() -> Result {
        let file = TempFile::new("complete");
        fs::write(
            &file.0,
            "sep=;\nZeitraum;HT [kWh];NT [kWh]\n08.01.2024 00:00;1.0;\n09.01.2024 00:00;1.0;\n",
        )?;
        let portal = FakePortal::default();

        export_csv(&portal, "1000", &selection("2024-01-08", "2024-01-09", 4)?, &file.0)?;

        assert!(portal.requested_weeks().is_empty());
        Ok(())
    }

    #[test]
    fn export_rejects_a_foreign_file() -> Result {
        let file = TempFile::new("foreign");
        fs::write(&file.0, "timestamp,value\n")?;
        let portal = FakePortal::default();

        let result =
            export_csv(&portal, "1000", &selection("2024-01-08", "2024-01-14", 4)?, &file.0);

        assert!(result.is_err());
        assert!(portal.requested_weeks().is_empty());
        assert_eq!(fs::read_to_string(&file.0)?, "timestamp,value\n");
        Ok(())
    }
}
