use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::{
    api::{Portal, ekz},
    cli::influxdb::InfluxDbArgs,
    core::{DataSelection, SelectionRequest, civil_time},
    export::{export_csv, export_time_series, fetch_readings},
    prelude::*,
    tables::build_readings_table,
};

#[derive(Parser)]
pub struct DataArgs {
    #[clap(flatten)]
    selection: SelectionArgs,

    #[command(subcommand)]
    command: DataCommand,
}

#[derive(Parser)]
pub struct SelectionArgs {
    /// Data type, for example `PK_VERB_15MIN` or `PK_VERB_TAG_EDM`.
    ///
    /// Defaults to the 15-minute data when the installation reports any,
    /// and to the daily data otherwise.
    #[clap(long = "type")]
    data_type: Option<String>,

    /// First day, `YYYY-MM-DD`.
    #[clap(long, value_parser = civil_time::parse_day)]
    from: Option<NaiveDate>,

    /// Last day, `YYYY-MM-DD`.
    #[clap(long, value_parser = civil_time::parse_day)]
    to: Option<NaiveDate>,

    /// Maximum number of weeks to fetch in one run.
    #[clap(short, long, default_value = "4")]
    limit: usize,
}

impl From<SelectionArgs> for SelectionRequest {
    fn from(args: SelectionArgs) -> Self {
        Self::builder()
            .maybe_data_type(args.data_type)
            .maybe_from(args.from)
            .maybe_to(args.to)
            .limit(args.limit)
            .build()
    }
}

impl DataArgs {
    pub fn run(self, api: &ekz::Api, installation_id: &str) -> Result {
        let today = civil_time::today();
        let properties = api.installation_properties(installation_id)?;
        let selection = DataSelection::new(&properties, self.selection.into(), today)?;
        info!(
            data_type = %selection.data_type,
            property = %selection.property_key,
            explicit = selection.is_explicit,
            from = %selection.from,
            to = %selection.to,
            available = %selection.available_ranges,
            "selected",
        );

        match self.command {
            DataCommand::Show => {
                let readings = fetch_readings(api, installation_id, &selection)?;
                println!("{}", build_readings_table(&readings));
            }
            DataCommand::Export(args) => match args.command {
                ExportCommand::Csv(args) => {
                    export_csv(api, installation_id, &selection, &args.path)?;
                }
                ExportCommand::Influxdb(args) => {
                    let (mut sink, target) = args.into_sink_and_target()?;
                    export_time_series(
                        api,
                        &mut sink,
                        installation_id,
                        &selection,
                        &target,
                        today,
                    )?;
                }
            },
        }
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum DataCommand {
    /// Print the requested weeks as a table.
    #[clap(name = "show")]
    Show,

    /// Export the data incrementally.
    #[clap(name = "export")]
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct ExportArgs {
    #[command(subcommand)]
    command: ExportCommand,
}

#[derive(Subcommand)]
pub enum ExportCommand {
    /// Keep a semicolon-separated file up to date.
    #[clap(name = "csv")]
    Csv(CsvArgs),

    /// Write the points to InfluxDB v2.
    #[clap(name = "influxdb")]
    Influxdb(Box<InfluxDbArgs>),
}

#[derive(Parser)]
pub struct CsvArgs {
    /// Dataset file, created when missing.
    #[clap(short = 'f', long = "file", value_name = "FILE")]
    path: PathBuf,
}
