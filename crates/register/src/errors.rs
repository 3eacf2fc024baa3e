use jsonrpsee::core::ClientError as RpcClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid registrar endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("params: {0}")]
    Params(String),

    #[error("registrar rpc: {0}")]
    Rpc(#[from] RpcClientError),
}
