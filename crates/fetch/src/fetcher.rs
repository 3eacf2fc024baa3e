//! Ingestion orchestrator.

use std::{fmt, sync::Arc, time::Duration};

use tokenscout_client::{AminoDecoder, RemoteChainClient, TxDecoder};
use tokenscout_db::Storage;
use tokenscout_events::EventSink;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    slots::SlotBuffer,
    worker::{spawn_range_worker, WorkerResponse},
    FetchError,
};

pub const DEFAULT_MAX_SLOTS: usize = 100;
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum number of ranges reserved but not yet committed.
    pub max_slots: usize,
    /// Maximum number of heights fetched by one worker.
    pub max_chunk_size: u64,
    pub poll_interval: Duration,
    /// Fetch attempts of a single range before giving up.
    pub max_fetch_attempts: u32,
    pub retry_delay: Duration,
    /// Only consider packages that construct a banker with literal metadata.
    pub require_banker_metadata: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_fetch_attempts: DEFAULT_MAX_FETCH_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            require_banker_metadata: false,
        }
    }
}

/// Keeps local storage in sync with the remote chain.
///
/// The fetcher is the only writer to storage and the only user of its [`SlotBuffer`].
/// Workers run concurrently and report back over a channel that the fetcher drains
/// on its own task.
pub struct Fetcher<S, C> {
    pub(crate) storage: Arc<S>,
    pub(crate) client: Arc<C>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) decoder: Arc<dyn TxDecoder>,
    pub(crate) config: FetcherConfig,
    slots: SlotBuffer,
}

impl<S, C> fmt::Debug for Fetcher<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl<S, C> Fetcher<S, C>
where
    S: Storage,
    C: RemoteChainClient,
{
    pub fn new(
        storage: Arc<S>,
        client: Arc<C>,
        events: Arc<dyn EventSink>,
        config: FetcherConfig,
    ) -> Self {
        let slots = SlotBuffer::new(config.max_slots);
        Self {
            storage,
            client,
            events,
            decoder: Arc::new(AminoDecoder),
            config,
            slots,
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn TxDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Runs until `cancel` fires, which returns `Ok`, or until a fatal error.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), FetchError> {
        // Room for every in-flight worker, so none stalls while a chunk commits.
        let (resp_tx, mut resp_rx) = mpsc::channel(self.config.max_slots.max(1));

        // The first tick completes immediately.
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            max_slots = self.config.max_slots,
            max_chunk_size = self.config.max_chunk_size,
            "starting fetcher"
        );

        let res = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break Ok(()),

                Some(resp) = resp_rx.recv() => {
                    if let Err(e) = self.handle_response(resp, &resp_tx).await {
                        break Err(e);
                    }
                }

                _ = ticker.tick() => {
                    if let Err(e) = self.attempt_range_fetch(&resp_tx).await {
                        break Err(e);
                    }
                }
            }
        };

        // Workers still in flight see a closed channel.
        resp_rx.close();
        let mut discarded = 0;
        while resp_rx.try_recv().is_ok() {
            discarded += 1;
        }

        match &res {
            Ok(()) => info!(%discarded, "fetcher stopped"),
            Err(e) => error!(err = %e, %discarded, "fetcher stopped on fatal error"),
        }
        res
    }

    async fn attempt_range_fetch(
        &mut self,
        resp_tx: &mpsc::Sender<WorkerResponse>,
    ) -> Result<(), FetchError> {
        if self.slots.is_full() {
            trace!(slots = self.slots.len(), "all slots reserved, skipping tick");
            return Ok(());
        }

        let local = self
            .storage
            .latest_height()
            .map_err(FetchError::LocalHeight)?
            .unwrap_or(0);

        let remote = match self.client.latest_height().await {
            Ok(height) => height,
            Err(e) => {
                warn!(err = %e, "failed to fetch remote height");
                return Ok(());
            }
        };

        if remote < local {
            return Err(FetchError::ChainReset { local, remote });
        }
        if remote == local {
            trace!(%local, "local height is up to date");
            return Ok(());
        }

        let from = self
            .slots
            .next_height()
            .map_or(local + 1, |next| next.max(local + 1));
        if from > remote {
            return Ok(());
        }

        let ranges = self
            .slots
            .reserve_ranges(from, remote, self.config.max_chunk_size);
        debug!(%local, %remote, count = ranges.len(), "reserved ranges");

        for range in ranges {
            spawn_range_worker(self.client.clone(), range, None, resp_tx.clone());
        }

        Ok(())
    }

    async fn handle_response(
        &mut self,
        resp: WorkerResponse,
        resp_tx: &mpsc::Sender<WorkerResponse>,
    ) -> Result<(), FetchError> {
        let WorkerResponse { range, result } = resp;

        match result {
            Ok(chunk) => {
                if !self.slots.set_chunk(range.from(), chunk) {
                    debug!(%range, "dropping response for unreserved range");
                    return Ok(());
                }
            }
            Err(e) => {
                let Some(attempts) = self.slots.record_failure(range.from()) else {
                    debug!(%range, "dropping failure for unreserved range");
                    return Ok(());
                };

                if attempts >= self.config.max_fetch_attempts {
                    return Err(FetchError::RangeExhausted {
                        range,
                        attempts,
                        last_error: e.to_string(),
                    });
                }

                warn!(%range, %attempts, err = %e, "failed to fetch range, retrying");
                spawn_range_worker(
                    self.client.clone(),
                    range,
                    Some(self.config.retry_delay),
                    resp_tx.clone(),
                );
                return Ok(());
            }
        }

        while let Some((range, chunk)) = self.slots.pop_front() {
            self.commit_chunk(range, chunk).await?;
        }

        Ok(())
    }
}
