//! Bounded-concurrency range fetcher that reassembles out-of-order chunks into
//! strictly ordered storage commits.

mod commit;
pub mod detect;
mod errors;
mod fetcher;
pub mod slots;
pub mod worker;

pub use errors::{FetchError, WorkerError};
pub use fetcher::{
    Fetcher, FetcherConfig, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_FETCH_ATTEMPTS, DEFAULT_MAX_SLOTS,
    DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY,
};
pub use slots::{Slot, SlotBuffer};
pub use worker::{fetch_range, WorkerResponse};
