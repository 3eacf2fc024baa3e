//! Per-chunk commit pipeline.

use tokenscout_client::RemoteChainClient;
use tokenscout_db::Storage;
use tokenscout_events::Event;
use tokenscout_primitives::prelude::*;
use tracing::*;

use crate::{detect::detect_tokens, FetchError, Fetcher};

impl<S, C> Fetcher<S, C>
where
    S: Storage,
    C: RemoteChainClient,
{
    /// Writes a ready chunk in a single batch together with the new latest height.
    ///
    /// Blocks or tx results that cannot be written are skipped. Events are published
    /// once the batch is committed, in height order.
    pub(crate) async fn commit_chunk(
        &self,
        range: ChunkRange,
        chunk: FetchedChunk,
    ) -> Result<(), FetchError> {
        let mut batch = self.storage.write_batch();
        let mut events = Vec::with_capacity(chunk.blocks().len());
        let (blocks, mut results) = chunk.into_parts();

        for block in blocks {
            let height = block.height();
            let block_results = results.remove(&height).unwrap_or_default();

            if let Err(e) = batch.set_block(&block) {
                warn!(%height, err = %e, "skipping block that could not be stored");
                continue;
            }

            let candidates = detect_tokens(
                self.client.as_ref(),
                self.decoder.as_ref(),
                &block,
                &block_results,
                self.config.require_banker_metadata,
            )
            .await;
            events.extend(candidates.into_iter().map(Event::TokenDetected));

            for result in &block_results {
                if let Err(e) = batch.set_tx(result) {
                    warn!(%height, index = result.index(), err = %e, "skipping tx result that could not be stored");
                }
            }

            events.push(Event::NewBlock {
                block,
                results: block_results,
            });
        }

        let height = range.to();
        if let Err(source) = batch.set_latest_height(height) {
            batch.rollback();
            return Err(FetchError::HeightMarker { height, source });
        }
        batch
            .commit()
            .map_err(|source| FetchError::Commit { range, source })?;

        debug!(%range, events = events.len(), "committed chunk");
        for event in events {
            self.events.signal_event(event);
        }

        Ok(())
    }
}
