mod credentials;
mod data;
mod influxdb;
mod installation;

use clap::{Parser, Subcommand};

use crate::{
    api::{Portal, ekz},
    cli::{credentials::CredentialArgs, installation::InstallationArgs},
    prelude::*,
    tables::build_contracts_table,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[clap(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn run(self) -> Result {
        let credentials = self.credentials.resolve()?;
        let api = ekz::Api::new(credentials.username, credentials.password);
        let result = self.command.run(&api);
        if let Err(error) = api.logout() {
            warn!("failed to log out: {error:#}");
        }
        result
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List the installations of the account.
    #[clap(name = "overview")]
    Overview,

    /// Inspect or export a single installation.
    #[clap(name = "installation")]
    Installation(Box<InstallationArgs>),
}

impl Command {
    fn run(self, api: &ekz::Api) -> Result {
        match self {
            Self::Overview => {
                let selection = api.installation_selection()?;
                info!(n_contracts = selection.contracts.len(), "fetched");
                println!("{}", build_contracts_table(&selection));
                Ok(())
            }
            Self::Installation(args) => args.run(api),
        }
    }
}
