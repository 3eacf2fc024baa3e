//! CLI argument parsing and environment variable handling.

use std::{env, path::PathBuf};

use argh::FromArgs;
use tokenscout_config::{parse_override, Override};

use crate::errors::*;

const ENV_REMOTE_URL: &str = "TOKENSCOUT_REMOTE_URL";
const ENV_DATADIR: &str = "TOKENSCOUT_DATADIR";

/// Configs overridable by environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvArgs {
    remote_url: Option<String>,
    datadir: Option<String>,
}

impl EnvArgs {
    /// Loads environment variables that should override the config.
    pub(crate) fn from_env() -> Self {
        Self {
            remote_url: env::var(ENV_REMOTE_URL).ok(),
            datadir: env::var(ENV_DATADIR).ok(),
        }
    }

    /// Get overrides gathered from env.
    pub(crate) fn get_overrides(&self) -> Vec<Override> {
        let mut overrides = Vec::new();
        if let Some(url) = &self.remote_url {
            overrides.push(Override::new("client.remote_url", url.as_str()));
        }
        if let Some(datadir) = &self.datadir {
            overrides.push(Override::new("db.datadir", datadir.as_str()));
        }
        overrides
    }
}

#[derive(Clone, Debug, FromArgs)]
#[argh(description = "Follows a Tendermint2 chain and registers the token contracts deployed on it")]
pub(crate) struct Args {
    // Config non-overriding args
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: Option<PathBuf>,

    // Config overriding args
    #[argh(
        option,
        short = 'd',
        description = "datadir path used mainly for databases"
    )]
    pub datadir: Option<PathBuf>,

    #[argh(option, description = "remote chain rpc url")]
    pub remote_url: Option<String>,

    #[argh(option, description = "maximum number of ranges fetched at once")]
    pub max_slots: Option<u64>,

    #[argh(option, description = "maximum number of blocks per range")]
    pub max_chunk_size: Option<u64>,

    #[argh(switch, description = "log in json format")]
    pub json_logs: bool,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o fetcher.max_slots=8 -o registrar.endpoint=http://signer`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Get overrides from the user and from explicit flags, flags last.
    pub(crate) fn get_all_overrides(&self) -> Result<Vec<Override>, InitError> {
        let mut overrides = self
            .overrides
            .iter()
            .map(|raw| parse_override(raw))
            .collect::<Result<Vec<_>, _>>()?;
        overrides.extend(self.get_internal_overrides()?);
        Ok(overrides)
    }

    /// Overrides passed directly as args attributes.
    fn get_internal_overrides(&self) -> Result<Vec<Override>, InitError> {
        let mut overrides = Vec::new();
        if let Some(datadir) = &self.datadir {
            let dd = datadir
                .to_str()
                .ok_or_else(|| InitError::InvalidDatadirPath(datadir.clone()))?;
            overrides.push(Override::new("db.datadir", dd));
        }
        if let Some(url) = &self.remote_url {
            overrides.push(Override::new("client.remote_url", url.as_str()));
        }
        if let Some(max_slots) = self.max_slots {
            let value = toml_int("max-slots", max_slots)?;
            overrides.push(Override::new("fetcher.max_slots", value));
        }
        if let Some(max_chunk_size) = self.max_chunk_size {
            let value = toml_int("max-chunk-size", max_chunk_size)?;
            overrides.push(Override::new("fetcher.max_chunk_size", value));
        }
        if self.json_logs {
            overrides.push(Override::new("logging.json_format", true));
        }
        Ok(overrides)
    }
}

/// TOML integers are signed 64-bit.
fn toml_int(flag: &'static str, value: u64) -> Result<i64, InitError> {
    i64::try_from(value).map_err(|_| InitError::FlagOutOfRange { flag, value })
}
