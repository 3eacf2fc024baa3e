//! In-memory [`Storage`] with failure injection, for tests of storage consumers.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use tokenscout_primitives::prelude::*;

use crate::{DbError, DbResult, Storage, WriteBatch};

#[derive(Debug, Default)]
struct StubState {
    blocks: BTreeMap<Height, Block>,
    txs: BTreeMap<(Height, u32), TxResult>,
    latest_height: Option<Height>,
    /// Heights of committed blocks in commit order.
    commit_log: Vec<Height>,
    /// Latest height marker written by each commit.
    marker_log: Vec<Height>,
    commits: usize,

    fail_blocks: HashSet<Height>,
    fail_height_marker: bool,
    fail_commit: bool,
    fail_read: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StubStorage {
    state: Arc<Mutex<StubState>>,
}

impl StubStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the store as if `height` had already been committed.
    pub fn with_latest_height(height: Height) -> Self {
        let storage = Self::new();
        storage.state.lock().latest_height = Some(height);
        storage
    }

    /// Makes `set_block` fail for the block at `height`.
    pub fn fail_block_at(&self, height: Height) {
        self.state.lock().fail_blocks.insert(height);
    }

    pub fn fail_height_marker(&self) {
        self.state.lock().fail_height_marker = true;
    }

    pub fn fail_commit(&self) {
        self.state.lock().fail_commit = true;
    }

    pub fn fail_reads(&self) {
        self.state.lock().fail_read = true;
    }

    /// Heights of every committed block, in the order they were committed.
    pub fn commit_log(&self) -> Vec<Height> {
        self.state.lock().commit_log.clone()
    }

    /// Latest height marker of every commit, in commit order.
    pub fn marker_log(&self) -> Vec<Height> {
        self.state.lock().marker_log.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().commits
    }

    pub fn tx_count(&self) -> usize {
        self.state.lock().txs.len()
    }
}

impl Storage for StubStorage {
    fn latest_height(&self) -> DbResult<Option<Height>> {
        let state = self.state.lock();
        if state.fail_read {
            return Err(DbError::IoError("injected read failure".to_string()));
        }
        Ok(state.latest_height)
    }

    fn write_batch(&self) -> Box<dyn WriteBatch> {
        Box::new(StubBatch {
            state: self.state.clone(),
            blocks: Vec::new(),
            txs: Vec::new(),
            latest_height: None,
        })
    }

    fn get_block(&self, height: Height) -> DbResult<Option<Block>> {
        Ok(self.state.lock().blocks.get(&height).cloned())
    }

    fn get_tx_result(&self, height: Height, index: u32) -> DbResult<Option<TxResult>> {
        Ok(self.state.lock().txs.get(&(height, index)).cloned())
    }

    fn get_tx_results(&self, height: Height) -> DbResult<Vec<TxResult>> {
        Ok(self
            .state
            .lock()
            .txs
            .range((height, 0)..=(height, u32::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }
}

#[derive(Debug)]
struct StubBatch {
    state: Arc<Mutex<StubState>>,
    blocks: Vec<Block>,
    txs: Vec<TxResult>,
    latest_height: Option<Height>,
}

impl WriteBatch for StubBatch {
    fn set_block(&mut self, block: &Block) -> DbResult<()> {
        if self.state.lock().fail_blocks.contains(&block.height()) {
            return Err(DbError::CodecError(format!(
                "injected failure at height {}",
                block.height()
            )));
        }
        self.blocks.push(block.clone());
        Ok(())
    }

    fn set_tx(&mut self, result: &TxResult) -> DbResult<()> {
        self.txs.push(result.clone());
        Ok(())
    }

    fn set_latest_height(&mut self, height: Height) -> DbResult<()> {
        if self.state.lock().fail_height_marker {
            return Err(DbError::Other("injected height marker failure".to_string()));
        }
        self.latest_height = Some(height);
        Ok(())
    }

    fn commit(self: Box<Self>) -> DbResult<()> {
        let StubBatch {
            state,
            blocks,
            txs,
            latest_height,
        } = *self;

        let mut state = state.lock();
        if state.fail_commit {
            return Err(DbError::TransactionError("injected commit failure".to_string()));
        }

        for block in blocks {
            state.commit_log.push(block.height());
            state.blocks.insert(block.height(), block);
        }
        for tx in txs {
            state.txs.insert((tx.height(), tx.index()), tx);
        }
        if let Some(height) = latest_height {
            state.latest_height = Some(height);
            state.marker_log.push(height);
        }
        state.commits += 1;
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}
