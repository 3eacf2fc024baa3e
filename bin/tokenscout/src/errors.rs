//! Error types for initialization.

use std::{io, path::PathBuf};

use thiserror::Error;
use tokenscout_client::ClientError;
use tokenscout_config::ConfigError;
use tokenscout_db::DbError;
use tokenscout_register::RegisterError;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("runtime: {0}")]
    RuntimeBuild(io::Error),

    #[error("datadir path is not valid utf-8: {0:?}")]
    InvalidDatadirPath(PathBuf),

    #[error("--{flag} value {value} does not fit in a config integer")]
    FlagOutOfRange { flag: &'static str, value: u64 },

    #[error("config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("storage: {0}")]
    Storage(#[from] DbError),

    #[error("remote client: {0}")]
    Client(#[from] ClientError),

    #[error("registrar: {0}")]
    Registrar(#[from] RegisterError),
}
