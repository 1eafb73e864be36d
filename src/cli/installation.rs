use clap::{Parser, Subcommand};

use crate::{
    api::{Portal, ekz},
    cli::data::DataArgs,
    prelude::*,
    tables::build_properties_table,
};

#[derive(Parser)]
pub struct InstallationArgs {
    /// Installation ID («Anlage»), as listed by `overview`.
    #[clap(value_name = "ID")]
    installation_id: String,

    #[command(subcommand)]
    command: InstallationCommand,
}

impl InstallationArgs {
    pub fn run(self, api: &ekz::Api) -> Result {
        match self.command {
            InstallationCommand::Properties => {
                let properties = api.installation_properties(&self.installation_id)?;
                println!("{}", build_properties_table(&properties));
                Ok(())
            }
            InstallationCommand::Data(args) => args.run(api, &self.installation_id),
        }
    }
}

#[derive(Subcommand)]
pub enum InstallationCommand {
    /// List the data properties and their validity windows.
    #[clap(name = "properties")]
    Properties,

    /// Show or export the consumption data.
    #[clap(name = "data")]
    Data(Box<DataArgs>),
}
