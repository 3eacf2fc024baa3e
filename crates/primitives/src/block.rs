use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::Height;

/// Raw transaction bytes as published by the node.
#[derive(Clone, Eq, PartialEq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Tx(#[serde(with = "hex::serde")] Vec<u8>);

impl Tx {
    pub fn new(raw: Vec<u8>) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx({})", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Tx {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// A committed block as stored locally.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Block {
    height: Height,
    #[serde(with = "hex::serde")]
    hash: Vec<u8>,
    chain_id: String,
    /// RFC 3339 timestamp as reported by the node.
    time: String,
    proposer: String,
    txs: Vec<Tx>,
}

impl Block {
    pub fn new(
        height: Height,
        hash: Vec<u8>,
        chain_id: String,
        time: String,
        proposer: String,
        txs: Vec<Tx>,
    ) -> Self {
        Self {
            height,
            hash,
            chain_id,
            time,
            proposer,
            txs,
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn proposer(&self) -> &str {
        &self.proposer
    }

    pub fn txs(&self) -> &[Tx] {
        &self.txs
    }
}

/// Outcome of delivering a single transaction.
#[derive(
    Clone, Debug, Default, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct DeliverResponse {
    /// Set when execution failed.
    pub error: Option<String>,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

impl DeliverResponse {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Execution result of the transaction at `index` in the block at `height`.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TxResult {
    height: Height,
    index: u32,
    tx: Tx,
    response: DeliverResponse,
}

impl TxResult {
    pub fn new(height: Height, index: u32, tx: Tx, response: DeliverResponse) -> Self {
        Self {
            height,
            index,
            tx,
            response,
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    pub fn response(&self) -> &DeliverResponse {
        &self.response
    }

    pub fn is_success(&self) -> bool {
        self.response.is_ok()
    }
}
