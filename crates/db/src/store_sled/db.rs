use std::path::Path;

use sled::{
    transaction::{ConflictableTransactionError, TransactionError, TransactionResult},
    Batch, Transactional, Tree,
};
use tokenscout_primitives::prelude::*;
use tracing::*;

use super::{
    init::open_sled_database,
    schema::{
        block_key, decode_height, decode_value, encode_value, tx_key, BLOCKS_TREE, LATEST_HEIGHT_KEY,
        META_TREE, TXS_TREE,
    },
    SLED_NAME,
};
use crate::{DbError, DbResult, Storage, WriteBatch};

/// Sled-backed [`Storage`].
#[derive(Debug, Clone)]
pub struct SledStorage {
    db: sled::Db,
    blocks: Tree,
    txs: Tree,
    meta: Tree,
}

impl SledStorage {
    pub fn new(db: sled::Db) -> DbResult<Self> {
        let blocks = db.open_tree(BLOCKS_TREE)?;
        let txs = db.open_tree(TXS_TREE)?;
        let meta = db.open_tree(META_TREE)?;
        Ok(Self {
            db,
            blocks,
            txs,
            meta,
        })
    }

    /// Opens the store under `<datadir>/sled/`.
    pub fn open(datadir: &Path) -> DbResult<Self> {
        Self::new(open_sled_database(datadir, SLED_NAME)?)
    }

    /// Opens a store that is removed once dropped.
    pub fn open_temporary() -> DbResult<Self> {
        Self::new(sled::Config::new().temporary(true).open()?)
    }

    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl Storage for SledStorage {
    fn latest_height(&self) -> DbResult<Option<Height>> {
        self.meta
            .get(LATEST_HEIGHT_KEY)?
            .map(|raw| decode_height(&raw))
            .transpose()
    }

    fn write_batch(&self) -> Box<dyn WriteBatch> {
        Box::new(SledWriteBatch::new(self.clone()))
    }

    fn get_block(&self, height: Height) -> DbResult<Option<Block>> {
        self.blocks
            .get(block_key(height))?
            .map(|raw| decode_value(&raw))
            .transpose()
    }

    fn get_tx_result(&self, height: Height, index: u32) -> DbResult<Option<TxResult>> {
        self.txs
            .get(tx_key(height, index))?
            .map(|raw| decode_value(&raw))
            .transpose()
    }

    fn get_tx_results(&self, height: Height) -> DbResult<Vec<TxResult>> {
        self.txs
            .scan_prefix(block_key(height))
            .map(|entry| {
                let (_, raw) = entry?;
                decode_value(&raw)
            })
            .collect()
    }
}

/// Buffers writes in memory and applies them in a single multi-tree transaction.
#[derive(Debug)]
pub struct SledWriteBatch {
    storage: SledStorage,
    blocks: Batch,
    txs: Batch,
    latest_height: Option<Height>,
}

impl SledWriteBatch {
    fn new(storage: SledStorage) -> Self {
        Self {
            storage,
            blocks: Batch::default(),
            txs: Batch::default(),
            latest_height: None,
        }
    }
}

impl WriteBatch for SledWriteBatch {
    fn set_block(&mut self, block: &Block) -> DbResult<()> {
        let value = encode_value(block)?;
        self.blocks.insert(&block_key(block.height())[..], value);
        Ok(())
    }

    fn set_tx(&mut self, result: &TxResult) -> DbResult<()> {
        let value = encode_value(result)?;
        self.txs
            .insert(&tx_key(result.height(), result.index())[..], value);
        Ok(())
    }

    fn set_latest_height(&mut self, height: Height) -> DbResult<()> {
        self.latest_height = Some(height);
        Ok(())
    }

    fn commit(self: Box<Self>) -> DbResult<()> {
        let SledWriteBatch {
            storage,
            blocks,
            txs,
            latest_height,
        } = *self;

        let res: TransactionResult<(), DbError> = (&storage.blocks, &storage.txs, &storage.meta)
            .transaction(|(blocks_tx, txs_tx, meta_tx)| {
                if let Some(new) = latest_height {
                    if let Some(raw) = meta_tx.get(LATEST_HEIGHT_KEY)? {
                        let current =
                            decode_height(&raw).map_err(ConflictableTransactionError::Abort)?;
                        if new <= current {
                            return Err(ConflictableTransactionError::Abort(
                                DbError::HeightRegression { current, new },
                            ));
                        }
                    }
                    meta_tx.insert(LATEST_HEIGHT_KEY, &block_key(new)[..])?;
                }
                blocks_tx.apply_batch(&blocks)?;
                txs_tx.apply_batch(&txs)?;
                Ok(())
            });

        res.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => DbError::TransactionError(e.to_string()),
        })?;

        report_flush(latest_height, storage.flush());
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        debug!(latest_height = ?self.latest_height, "discarding write batch");
    }
}

/// The applied transaction is already visible to readers and sled keeps flushing in the
/// background, so a failed explicit flush does not fail the commit.
fn report_flush(latest_height: Option<Height>, flushed: DbResult<()>) -> bool {
    match flushed {
        Ok(()) => true,
        Err(e) => {
            warn!(?latest_height, err = %e, "committed batch but flush failed");
            false
        }
    }
}
