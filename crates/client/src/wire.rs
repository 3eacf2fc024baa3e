//! JSON shapes of the node's RPC responses.
//!
//! The node encodes 64-bit integers as strings and byte slices as base64.

use std::{fmt::Display, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use tokenscout_primitives::prelude::*;

use crate::{AbciResponse, BlockResults, ClientError};

fn de_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<i64>,
    <T as FromStr>::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(i64),
    }

    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Str(s) if s.is_empty() => {
            T::try_from(0i64).map_err(|_| de::Error::custom("integer out of range"))
        }
        StrOrNum::Str(s) => s.parse().map_err(de::Error::custom),
        StrOrNum::Num(n) => T::try_from(n).map_err(|_| de::Error::custom("integer out of range")),
    }
}

fn decode_b64(field: &str, value: Option<&str>) -> Result<Vec<u8>, ClientError> {
    match value {
        None => Ok(Vec::new()),
        Some(s) => STANDARD
            .decode(s)
            .map_err(|e| ClientError::decode(format!("{field}: {e}"))),
    }
}

/// Renders an amino error object (`{"@type": ..., ...}`) as a message, `None` when unset.
fn error_message(value: &Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(obj)) => Some(
            obj.get("@type")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        ),
        Some(other) => Some(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub(crate) sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncInfo {
    #[serde(deserialize_with = "de_int")]
    pub(crate) latest_block_height: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResponse {
    block_meta: BlockMeta,
    block: RawBlock,
}

#[derive(Debug, Deserialize)]
struct BlockMeta {
    block_id: BlockId,
}

#[derive(Debug, Deserialize)]
struct BlockId {
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    header: Header,
    data: BlockData,
}

#[derive(Debug, Deserialize)]
struct Header {
    chain_id: String,
    #[serde(deserialize_with = "de_int")]
    height: u64,
    time: String,
    #[serde(default)]
    proposer_address: String,
}

#[derive(Debug, Deserialize)]
struct BlockData {
    txs: Option<Vec<String>>,
}

impl TryFrom<BlockResponse> for Block {
    type Error = ClientError;

    fn try_from(value: BlockResponse) -> Result<Self, Self::Error> {
        let BlockResponse { block_meta, block } = value;
        let hash = decode_b64("block_id.hash", block_meta.block_id.hash.as_deref())?;
        let txs = block
            .data
            .txs
            .unwrap_or_default()
            .iter()
            .map(|raw| decode_b64("block.data.txs", Some(raw)).map(Tx::new))
            .collect::<Result<Vec<_>, _>>()?;

        let header = block.header;
        Ok(Block::new(
            header.height,
            hash,
            header.chain_id,
            header.time,
            header.proposer_address,
            txs,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResultsResponse {
    #[serde(deserialize_with = "de_int")]
    height: u64,
    results: RawResults,
}

#[derive(Debug, Deserialize)]
struct RawResults {
    deliver_tx: Option<Vec<RawDeliverTx>>,
}

#[derive(Debug, Deserialize)]
struct ResponseBase {
    #[serde(rename = "Error")]
    error: Option<Value>,
    #[serde(rename = "Data")]
    data: Option<String>,
    #[serde(rename = "Log", default)]
    log: String,
    #[serde(rename = "Info", default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct RawDeliverTx {
    #[serde(rename = "ResponseBase")]
    base: ResponseBase,
    #[serde(rename = "GasWanted", deserialize_with = "de_int")]
    gas_wanted: i64,
    #[serde(rename = "GasUsed", deserialize_with = "de_int")]
    gas_used: i64,
}

impl TryFrom<BlockResultsResponse> for BlockResults {
    type Error = ClientError;

    fn try_from(value: BlockResultsResponse) -> Result<Self, Self::Error> {
        let deliver_tx = value
            .results
            .deliver_tx
            .unwrap_or_default()
            .into_iter()
            .map(|raw| {
                Ok(DeliverResponse {
                    error: error_message(&raw.base.error),
                    data: decode_b64("ResponseBase.Data", raw.base.data.as_deref())?,
                    log: raw.base.log,
                    info: raw.base.info,
                    gas_wanted: raw.gas_wanted,
                    gas_used: raw.gas_used,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(BlockResults {
            height: value.height,
            deliver_tx,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbciQueryResponse {
    response: RawQuery,
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    #[serde(rename = "ResponseBase")]
    base: ResponseBase,
    #[serde(rename = "Value")]
    value: Option<String>,
    #[serde(rename = "Height", default, deserialize_with = "de_int")]
    height: u64,
}

impl TryFrom<AbciQueryResponse> for AbciResponse {
    type Error = ClientError;

    fn try_from(value: AbciQueryResponse) -> Result<Self, Self::Error> {
        let RawQuery {
            base,
            value,
            height,
        } = value.response;
        Ok(AbciResponse {
            error: error_message(&base.error),
            data: decode_b64("ResponseBase.Data", base.data.as_deref())?,
            value: decode_b64("Value", value.as_deref())?,
            log: base.log,
            height,
        })
    }
}
