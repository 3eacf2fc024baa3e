//! Stateless fetch unit for one reserved range.

use std::{any::Any, collections::HashMap, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokenscout_client::{block_checked, ClientError, RemoteChainClient};
use tokenscout_primitives::prelude::*;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::*;

use crate::WorkerError;

/// Outcome of one range assignment, sent back to the fetcher exactly once.
#[derive(Debug)]
pub struct WorkerResponse {
    pub range: ChunkRange,
    pub result: Result<FetchedChunk, WorkerError>,
}

/// Fetches every block of `range` together with its transaction results.
///
/// The range is all-or-nothing: the first failing height fails the whole chunk.
pub async fn fetch_range<C: RemoteChainClient>(
    client: &C,
    range: ChunkRange,
) -> Result<FetchedChunk, ClientError> {
    let mut blocks = Vec::new();
    let mut results = HashMap::new();

    for height in range.heights() {
        let (block, block_results) =
            futures::try_join!(block_checked(client, height), client.block_results(height))?;
        results.insert(height, block_results.into_tx_results(&block)?);
        blocks.push(block);
    }

    Ok(FetchedChunk::new(blocks, results))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Runs [`fetch_range`], turning a panic into an error response.
async fn fetch_range_caught<C: RemoteChainClient>(
    client: &C,
    range: ChunkRange,
) -> Result<FetchedChunk, WorkerError> {
    match AssertUnwindSafe(fetch_range(client, range))
        .catch_unwind()
        .await
    {
        Ok(result) => result.map_err(WorkerError::from),
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(%range, %msg, "range worker panicked");
            Err(WorkerError::Panicked(msg))
        }
    }
}

/// Spawns a worker for `range`, optionally waiting `delay` first.
///
/// The worker only touches the response channel, and a closed channel is not an
/// error: the fetcher stops listening once cancelled. A panic while fetching is
/// reported like any other failure so the slot is never left waiting.
pub(crate) fn spawn_range_worker<C: RemoteChainClient>(
    client: Arc<C>,
    range: ChunkRange,
    delay: Option<Duration>,
    resp_tx: mpsc::Sender<WorkerResponse>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(delay) = delay {
            time::sleep(delay).await;
        }

        let result = fetch_range_caught(client.as_ref(), range).await;
        if let Err(e) = &result {
            debug!(%range, err = %e, "range fetch failed");
        }

        if resp_tx.send(WorkerResponse { range, result }).await.is_err() {
            trace!(%range, "fetcher stopped listening, dropping response");
        }
    })
}
