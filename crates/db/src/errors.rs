use std::io;

use thiserror::Error;
use tokenscout_primitives::Height;

#[derive(Debug, Error, Clone)]
pub enum DbError {
    #[error("codec error {0}")]
    CodecError(String),

    #[error("transaction error {0}")]
    TransactionError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    /// The latest height marker must only move forward.
    #[error("tried to move latest height back from {current} to {new}")]
    HeightRegression { current: Height, new: Height },

    #[error("{0}")]
    Other(String),
}

impl From<sled::Error> for DbError {
    fn from(value: sled::Error) -> Self {
        Self::Other(format!("sled error: {value:?}"))
    }
}

impl From<io::Error> for DbError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
