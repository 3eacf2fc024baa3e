//! Storage interfaces consumed by the ingestion pipeline.

use tokenscout_primitives::prelude::*;

use crate::DbResult;

/// Ordered store of committed blocks, their transaction results and the latest
/// committed height.
pub trait Storage: Send + Sync + 'static {
    /// Returns the latest committed height, `None` if nothing was committed yet.
    fn latest_height(&self) -> DbResult<Option<Height>>;

    /// Opens a new batch. Nothing written through it is visible before
    /// [`WriteBatch::commit`].
    fn write_batch(&self) -> Box<dyn WriteBatch>;

    fn get_block(&self, height: Height) -> DbResult<Option<Block>>;

    fn get_tx_result(&self, height: Height, index: u32) -> DbResult<Option<TxResult>>;

    /// Returns the results of every transaction of the block at `height`, by index.
    fn get_tx_results(&self, height: Height) -> DbResult<Vec<TxResult>>;
}

/// Atomic group of writes.
///
/// Both [`commit`](Self::commit) and [`rollback`](Self::rollback) consume the batch.
/// A batch dropped without a commit is discarded.
pub trait WriteBatch: Send {
    fn set_block(&mut self, block: &Block) -> DbResult<()>;

    fn set_tx(&mut self, result: &TxResult) -> DbResult<()>;

    fn set_latest_height(&mut self, height: Height) -> DbResult<()>;

    fn commit(self: Box<Self>) -> DbResult<()>;

    fn rollback(self: Box<Self>);
}
