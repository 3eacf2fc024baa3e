//! Tree layout and key/value encoding.
//!
//! Heights are encoded big-endian so sled's lexicographic order matches height order.

use borsh::{BorshDeserialize, BorshSerialize};
use tokenscout_primitives::Height;

use crate::{DbError, DbResult};

pub(crate) const BLOCKS_TREE: &str = "blocks";
pub(crate) const TXS_TREE: &str = "txs";
pub(crate) const META_TREE: &str = "meta";

pub(crate) const LATEST_HEIGHT_KEY: &[u8] = b"latest_height";

pub(crate) fn block_key(height: Height) -> [u8; 8] {
    height.to_be_bytes()
}

pub(crate) fn tx_key(height: Height, index: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&height.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

pub(crate) fn encode_value<T: BorshSerialize>(value: &T) -> DbResult<Vec<u8>> {
    borsh::to_vec(value).map_err(|e| DbError::CodecError(e.to_string()))
}

pub(crate) fn decode_value<T: BorshDeserialize>(bytes: &[u8]) -> DbResult<T> {
    borsh::from_slice(bytes).map_err(|e| DbError::CodecError(e.to_string()))
}

pub(crate) fn decode_height(bytes: &[u8]) -> DbResult<Height> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::CodecError(format!("bad height length {}", bytes.len())))?;
    Ok(Height::from_be_bytes(raw))
}
