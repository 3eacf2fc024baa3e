use jsonrpsee::core::ClientError as RpcClientError;
use thiserror::Error;
use tokenscout_primitives::Height;

/// Errors that can occur when talking to the remote node.
#[derive(Debug, Error)]
pub enum ClientError {
    /// RPC call failed.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The node answered with something we could not interpret.
    #[error("decode error: {0}")]
    Decode(String),

    /// The node returned a block for another height than requested.
    #[error("requested block {requested}, got {actual}")]
    HeightMismatch { requested: Height, actual: Height },

    /// The ABCI application rejected the query.
    #[error("abci query {path} failed: {error}")]
    Abci { path: String, error: String },
}

impl ClientError {
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<RpcClientError> for ClientError {
    fn from(value: RpcClientError) -> Self {
        Self::Rpc(value.to_string())
    }
}
