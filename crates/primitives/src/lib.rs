//! Collection of data types shared by the ingestion pipeline, storage and event bus.

pub mod block;
pub mod chunk;
pub mod errors;
pub mod msg;

/// Ordinal position of a block in the chain.
pub type Height = u64;

pub mod prelude {
    pub use crate::{
        block::{Block, DeliverResponse, Tx, TxResult},
        chunk::{ChunkRange, FetchedChunk},
        msg::{MemFile, MemPackage, Message},
        Height,
    };
}
