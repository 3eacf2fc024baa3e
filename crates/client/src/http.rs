use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use jsonrpsee::{
    core::{client::ClientT, params::ObjectParams},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use tokenscout_primitives::prelude::*;
use tracing::*;

use crate::{
    wire::{AbciQueryResponse, BlockResponse, BlockResultsResponse, StatusResponse},
    AbciResponse, BlockResults, ClientError, RemoteChainClient,
};

/// JSON-RPC client of a Tendermint2 node over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    client: HttpClient,
}

impl HttpChainClient {
    pub fn try_new(url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::rpc(format!("unsupported remote scheme: {url}")));
        }

        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(url)
            .map_err(|e| ClientError::rpc(e.to_string()))?;
        Ok(Self { client })
    }

    fn height_params(height: Height) -> Result<ObjectParams, ClientError> {
        let mut params = ObjectParams::new();
        params
            .insert("height", height.to_string())
            .map_err(|e| ClientError::rpc(e.to_string()))?;
        Ok(params)
    }
}

#[async_trait]
impl RemoteChainClient for HttpChainClient {
    async fn latest_height(&self) -> Result<Height, ClientError> {
        let status: StatusResponse = self.client.request("status", rpc_params![]).await?;
        Ok(status.sync_info.latest_block_height)
    }

    async fn block(&self, height: Height) -> Result<Block, ClientError> {
        trace!(%height, "fetching block");
        let resp: BlockResponse = self
            .client
            .request("block", Self::height_params(height)?)
            .await?;
        Block::try_from(resp)
    }

    async fn block_results(&self, height: Height) -> Result<BlockResults, ClientError> {
        trace!(%height, "fetching block results");
        let resp: BlockResultsResponse = self
            .client
            .request("block_results", Self::height_params(height)?)
            .await?;
        BlockResults::try_from(resp)
    }

    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<AbciResponse, ClientError> {
        debug!(%path, "abci query");
        let mut params = ObjectParams::new();
        params
            .insert("path", path)
            .map_err(|e| ClientError::rpc(e.to_string()))?;
        params
            .insert("data", STANDARD.encode(data))
            .map_err(|e| ClientError::rpc(e.to_string()))?;

        let resp: AbciQueryResponse = self.client.request("abci_query", params).await?;
        AbciResponse::try_from(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let err = HttpChainClient::try_new("ws://127.0.0.1:26657", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_builds_http_client() {
        assert!(HttpChainClient::try_new("http://127.0.0.1:26657", Duration::from_secs(1)).is_ok());
    }
}
