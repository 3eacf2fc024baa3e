use async_trait::async_trait;
use serde::Deserialize;
use tokenscout_primitives::prelude::*;

use crate::ClientError;

/// ABCI query path listing the exported functions of a package.
pub const QFUNCS_PATH: &str = "vm/qfuncs";

/// Execution outcomes of every transaction of one block, by index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockResults {
    pub height: Height,
    pub deliver_tx: Vec<DeliverResponse>,
}

impl BlockResults {
    /// Pairs each outcome with the transaction of `block` at the same index.
    pub fn into_tx_results(self, block: &Block) -> Result<Vec<TxResult>, ClientError> {
        if self.height != block.height() {
            return Err(ClientError::HeightMismatch {
                requested: block.height(),
                actual: self.height,
            });
        }
        if self.deliver_tx.len() != block.txs().len() {
            return Err(ClientError::decode(format!(
                "block {} has {} txs but {} results",
                block.height(),
                block.txs().len(),
                self.deliver_tx.len()
            )));
        }

        Ok(self
            .deliver_tx
            .into_iter()
            .zip(block.txs())
            .enumerate()
            .map(|(idx, (response, tx))| {
                TxResult::new(block.height(), idx as u32, tx.clone(), response)
            })
            .collect())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AbciResponse {
    /// Set when the application rejected the query.
    pub error: Option<String>,
    pub data: Vec<u8>,
    pub value: Vec<u8>,
    pub log: String,
    pub height: Height,
}

/// Query interface to the remote chain node.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait RemoteChainClient: Send + Sync + 'static {
    /// Returns the height of the latest block known to the node.
    async fn latest_height(&self) -> Result<Height, ClientError>;

    async fn block(&self, height: Height) -> Result<Block, ClientError>;

    async fn block_results(&self, height: Height) -> Result<BlockResults, ClientError>;

    /// Runs an ABCI query against the node's application.
    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<AbciResponse, ClientError>;
}

/// Returns the block at `height`.
///
/// This is a checked version of [`RemoteChainClient::block`] that validates the node
/// answered with the requested height.
pub async fn block_checked(
    client: &impl RemoteChainClient,
    height: Height,
) -> Result<Block, ClientError> {
    let block = client.block(height).await?;
    if block.height() != height {
        return Err(ClientError::HeightMismatch {
            requested: height,
            actual: block.height(),
        });
    }
    Ok(block)
}

#[derive(Debug, Deserialize)]
struct FuncSignature {
    #[serde(rename = "FuncName")]
    name: String,
}

/// Returns the names of the functions exported by the package at `pkg_path`.
pub async fn query_exported_functions(
    client: &impl RemoteChainClient,
    pkg_path: &str,
) -> Result<Vec<String>, ClientError> {
    let res = client.abci_query(QFUNCS_PATH, pkg_path.as_bytes()).await?;
    if let Some(error) = res.error {
        return Err(ClientError::Abci {
            path: pkg_path.to_owned(),
            error,
        });
    }

    let sigs: Vec<FuncSignature> = serde_json::from_slice(&res.data)
        .map_err(|e| ClientError::decode(format!("qfuncs response for {pkg_path}: {e}")))?;
    Ok(sigs.into_iter().map(|sig| sig.name).collect())
}
