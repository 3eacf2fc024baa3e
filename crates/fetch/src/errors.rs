use thiserror::Error;
use tokenscout_client::ClientError;
use tokenscout_db::DbError;
use tokenscout_primitives::prelude::*;

/// Conditions that stop ingestion.
///
/// Per-item problems (a block or tx result that cannot be stored, a failed query while
/// classifying a package) are logged and never surface here.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("reading local height: {0}")]
    LocalHeight(#[source] DbError),

    /// The remote chain is behind what was already committed locally.
    #[error("remote height {remote} is below local height {local}, chain was reset")]
    ChainReset { local: Height, remote: Height },

    #[error("writing latest height {height}: {source}")]
    HeightMarker {
        height: Height,
        #[source]
        source: DbError,
    },

    #[error("committing chunk {range}: {source}")]
    Commit {
        range: ChunkRange,
        #[source]
        source: DbError,
    },

    #[error("fetching chunk {range} failed {attempts} times, last error: {last_error}")]
    RangeExhausted {
        range: ChunkRange,
        attempts: u32,
        last_error: String,
    },
}

/// Why a worker could not deliver its range.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("worker panicked: {0}")]
    Panicked(String),
}
