use std::{env, fs, path::Path};

use clap::Parser;

use crate::{api::influxdb, error::ExportError, export::Target, prelude::*};

/// Special `--config` value that reads the connection from the environment.
const FROM_ENV: &str = "ENV";

const INI_SECTION: &str = "influx2";

#[derive(Parser)]
pub struct InfluxDbArgs {
    /// Client configuration: an INI file with an `[influx2]` section,
    /// or `ENV` to read `INFLUXDB_V2_URL`, `INFLUXDB_V2_TOKEN` and `INFLUXDB_V2_ORG`.
    ///
    /// The explicit options below take precedence.
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<String>,

    /// Server URL, for example `http://localhost:8086`.
    #[clap(short = 'u', long, env = "INFLUXDB_URL")]
    pub url: Option<String>,

    #[clap(short = 't', long, env = "INFLUXDB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Organization, `default` unless configured otherwise.
    #[clap(short = 'o', long, env = "INFLUXDB_ORG")]
    pub org: Option<String>,

    #[clap(short = 'b', long, env = "INFLUXDB_BUCKET")]
    pub bucket: String,

    #[clap(short = 'm', long, env = "INFLUXDB_MEASUREMENT", default_value = "ekz_energy")]
    pub measurement: String,

    #[clap(short = 'f', long, env = "INFLUXDB_FIELD", default_value = "energy_15min")]
    pub field: String,
}

/// Partially known connection, merged from the options and the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub org: Option<String>,
}

impl InfluxDbArgs {
    pub fn into_sink_and_target(self) -> Result<(influxdb::Api, Target)> {
        let configured = match self.config.as_deref() {
            None => Connection::default(),
            Some(FROM_ENV) => Connection::from_env(|key| env::var(key).ok()),
            Some(path) => Connection::read_ini(Path::new(path))?,
        };
        let connection = Connection { url: self.url, token: self.token, org: self.org }
            .or(configured);
        let url = connection.url.ok_or_else(|| missing("url", "INFLUXDB_URL"))?;
        let token = connection.token.ok_or_else(|| missing("token", "INFLUXDB_TOKEN"))?;
        let org = connection.org.unwrap_or_else(|| "default".to_string());
        info!(%url, %org, bucket = %self.bucket, "connecting to InfluxDB");
        let sink = influxdb::Api::new(&url, token, org, self.bucket);
        Ok((sink, Target { measurement: self.measurement, field: self.field }))
    }
}

fn missing(key: &str, variable: &str) -> ExportError {
    ExportError::Configuration(format!(
        "no InfluxDB {key}: pass `--{key}`, set `{variable}`, or use `--config`"
    ))
}

impl Connection {
    /// Fill in what is missing here from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            url: self.url.or(other.url),
            token: self.token.or(other.token),
            org: self.org.or(other.org),
        }
    }

    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup("INFLUXDB_V2_URL"),
            token: lookup("INFLUXDB_V2_TOKEN"),
            org: lookup("INFLUXDB_V2_ORG"),
        }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_ini(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let connection = Self::parse_ini(&contents).map_err(|error| {
            ExportError::Configuration(format!("invalid `{}`: {error:#}", path.display()))
        })?;
        Ok(connection)
    }

    pub fn parse_ini(contents: &str) -> Result<Self> {
        let ini = ini::Ini::load_from_str(contents)?;
        let section = ini
            .section(Some(INI_SECTION))
            .with_context(|| format!("no `[{INI_SECTION}]` section"))?;
        // Values may be quoted: `url="http://localhost:8086"`.
        let get = |key: &str| section.get(key).map(|value| value.trim_matches('"').to_string());
        Ok(Self { url: get("url"), token: get("token"), org: get("org") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // language=INI
    const CONFIG: &str = r#"
[influx2]
url = "http://localhost:8086"
token = my-token
org = "home"
"#;

    #[test]
    fn parse_ini_ok() -> Result {
        let connection = Connection::parse_ini(CONFIG)?;
        assert_eq!(connection.url.as_deref(), Some("http://localhost:8086"));
        assert_eq!(connection.token.as_deref(), Some("my-token"));
        assert_eq!(connection.org.as_deref(), Some("home"));
        Ok(())
    }

    #[test]
    fn parse_ini_without_section_fails() {
        assert!(Connection::parse_ini("[other]\nurl = http://localhost:8086\n").is_err());
    }

    #[test]
    fn read_ini_ok() -> Result {
        let path = env::temp_dir().join(format!("ekzexport-influx-{}.ini", std::process::id()));
        fs::write(&path, CONFIG)?;
        let connection = Connection::read_ini(&path);
        fs::remove_file(&path)?;
        assert_eq!(connection?.org.as_deref(), Some("home"));
        Ok(())
    }

    #[test]
    fn read_invalid_ini_is_typed() -> Result {
        let path = env::temp_dir().join(format!("ekzexport-invalid-{}.ini", std::process::id()));
        fs::write(&path, "url = http://localhost:8086\n")?;
        let error = Connection::read_ini(&path).unwrap_err();
        fs::remove_file(&path)?;
        assert!(matches!(error.downcast_ref(), Some(ExportError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn from_env_ok() {
        let connection = Connection::from_env(|key| match key {
            "INFLUXDB_V2_URL" => Some("http://influx:8086".to_string()),
            "INFLUXDB_V2_TOKEN" => Some("env-token".to_string()),
            _ => None,
        });
        assert_eq!(
            connection,
            Connection {
                url: Some("http://influx:8086".to_string()),
                token: Some("env-token".to_string()),
                org: None,
            }
        );
    }

    #[test]
    fn options_take_precedence() -> Result {
        let options = Connection { url: None, token: Some("flag-token".to_string()), org: None };
        let connection = options.or(Connection::parse_ini(CONFIG)?);
        assert_eq!(connection.url.as_deref(), Some("http://localhost:8086"));
        assert_eq!(connection.token.as_deref(), Some("flag-token"));
        assert_eq!(connection.org.as_deref(), Some("home"));
        Ok(())
    }

    #[test]
    fn missing_url_fails() {
        let args = InfluxDbArgs {
            config: None,
            url: None,
            token: Some("token".to_string()),
            org: None,
            bucket: "energy".to_string(),
            measurement: "ekz_energy".to_string(),
            field: "energy_15min".to_string(),
        };
        let error = args.into_sink_and_target().err();
        assert!(matches!(
            error.as_ref().and_then(Error::downcast_ref::<ExportError>),
            Some(ExportError::Configuration(_))
        ));
    }
}
