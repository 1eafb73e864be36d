use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::Deserialize;

use crate::{error::ExportError, prelude::*};

const APP_NAME: &str = "ekzexport";

/// Tried in this order within each directory.
const CONFIG_FILE_NAMES: [&str; 2] = ["ekzexport.toml", "ekzexport.json"];

#[derive(Parser)]
pub struct CredentialArgs {
    /// myEKZ username, falls back to `ekzexport.toml`.
    #[clap(long, env = "EKZ_USERNAME", global = true)]
    pub username: Option<String>,

    /// myEKZ password, falls back to `ekzexport.toml`.
    #[clap(long, env = "EKZ_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Default, Deserialize)]
struct ConfigFile {
    #[serde(alias = "user")]
    username: Option<String>,
    password: Option<String>,
}

impl CredentialArgs {
    /// Fill in whatever is missing from the first configuration file found.
    pub fn resolve(self) -> Result<Credentials> {
        let (username, password) = match (self.username, self.password) {
            (Some(username), Some(password)) => (Some(username), Some(password)),
            (username, password) => {
                let file = ConfigFile::discover()?;
                (username.or(file.username), password.or(file.password))
            }
        };
        let username = username.ok_or_else(|| missing("username", "EKZ_USERNAME"))?;
        let password = password.ok_or_else(|| missing("password", "EKZ_PASSWORD"))?;
        Ok(Credentials { username, password })
    }
}

fn missing(key: &str, variable: &str) -> ExportError {
    ExportError::Configuration(format!(
        "no {key}: pass `--{key}`, set `{variable}`, or put it into `{}`",
        CONFIG_FILE_NAMES[0],
    ))
}

impl ConfigFile {
    fn discover() -> Result<Self> {
        for path in search_paths() {
            if let Some(file) = Self::read(&path)? {
                info!(path = %path.display(), "loaded the configuration");
                return Ok(file);
            }
        }
        debug!("no configuration file");
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| format!("failed to read `{}`", path.display()));
            }
        };
        let invalid = |error: &dyn std::fmt::Display| {
            ExportError::Configuration(format!("invalid `{}`: {error}", path.display()))
        };
        let file = if path.extension().is_some_and(|extension| extension == "json") {
            serde_json::from_str(&contents).map_err(|error| invalid(&error))?
        } else {
            toml::from_str(&contents).map_err(|error| invalid(&error))?
        };
        Ok(Some(file))
    }
}

/// Current directory, home, then the user and the system configuration directories.
fn search_paths() -> Vec<PathBuf> {
    let mut directories = vec![PathBuf::from(".")];
    directories.extend(env::var_os("HOME").map(PathBuf::from));
    // `$XDG_CONFIG_HOME`, or `~/.config` when unset.
    directories.extend(dirs::config_dir().map(|directory| directory.join(APP_NAME)));
    directories.push(Path::new("/etc/xdg").join(APP_NAME));
    directories
        .into_iter()
        .flat_map(|directory| CONFIG_FILE_NAMES.map(|name| directory.join(name)))
        .collect()
}
