//! Binary amino form of `std.Tx`.
//!
//! Amino's binary encoding of the structs below is wire compatible with proto3, and
//! interface values (the tx messages) travel as an `Any` carrying the registered type
//! url. Fields the pipeline never reads (fee, signatures, memo) are skipped.

use prost::Message as _;
use tokenscout_primitives::prelude::*;

use crate::{
    decode::{TYPE_ADD_PACKAGE, TYPE_CALL, TYPE_RUN, TYPE_SEND},
    ClientError,
};

#[derive(Clone, PartialEq, prost::Message)]
struct AminoTx {
    #[prost(message, repeated, tag = "1")]
    msgs: Vec<AminoAny>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoAny {
    #[prost(string, tag = "1")]
    type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    value: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoCoin {
    #[prost(string, tag = "1")]
    denom: String,
    #[prost(int64, tag = "2")]
    amount: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMemFile {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(string, tag = "2")]
    body: String,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMemPackage {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(string, tag = "2")]
    path: String,
    #[prost(message, repeated, tag = "3")]
    files: Vec<AminoMemFile>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMsgAddPackage {
    #[prost(bytes = "vec", tag = "1")]
    creator: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    package: Option<AminoMemPackage>,
    #[prost(message, repeated, tag = "3")]
    deposit: Vec<AminoCoin>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMsgCall {
    #[prost(bytes = "vec", tag = "1")]
    caller: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    send: Vec<AminoCoin>,
    #[prost(string, tag = "3")]
    pkg_path: String,
    #[prost(string, tag = "4")]
    func: String,
    #[prost(string, repeated, tag = "5")]
    args: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMsgRun {
    #[prost(bytes = "vec", tag = "1")]
    caller: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    send: Vec<AminoCoin>,
    #[prost(message, optional, tag = "3")]
    package: Option<AminoMemPackage>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct AminoMsgSend {
    #[prost(bytes = "vec", tag = "1")]
    from_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    to_address: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    amount: Vec<AminoCoin>,
}

impl From<AminoMemPackage> for MemPackage {
    fn from(value: AminoMemPackage) -> Self {
        MemPackage {
            name: value.name,
            path: value.path,
            files: value
                .files
                .into_iter()
                .map(|f| MemFile {
                    name: f.name,
                    body: f.body,
                })
                .collect(),
        }
    }
}

impl From<&MemPackage> for AminoMemPackage {
    fn from(value: &MemPackage) -> Self {
        AminoMemPackage {
            name: value.name.clone(),
            path: value.path.clone(),
            files: value
                .files
                .iter()
                .map(|f| AminoMemFile {
                    name: f.name.clone(),
                    body: f.body.clone(),
                })
                .collect(),
        }
    }
}

/// Renders coins the way the node prints them, e.g. `10ugnot,5foo`.
fn coins_string(coins: &[AminoCoin]) -> String {
    coins
        .iter()
        .map(|c| format!("{}{}", c.amount, c.denom))
        .collect::<Vec<_>>()
        .join(",")
}

fn package_or_default(package: Option<AminoMemPackage>) -> MemPackage {
    package.map(Into::into).unwrap_or_default()
}

fn decode_value<M: prost::Message + Default>(any: &AminoAny) -> Result<M, ClientError> {
    M::decode(any.value.as_slice())
        .map_err(|e| ClientError::decode(format!("{}: {e}", any.type_url)))
}

fn decode_any(any: AminoAny) -> Result<Message, ClientError> {
    let msg = match any.type_url.as_str() {
        TYPE_ADD_PACKAGE => {
            let msg: AminoMsgAddPackage = decode_value(&any)?;
            Message::AddPackage {
                creator: hex::encode(msg.creator),
                package: package_or_default(msg.package),
                deposit: coins_string(&msg.deposit),
            }
        }
        TYPE_CALL => {
            let msg: AminoMsgCall = decode_value(&any)?;
            Message::Call {
                caller: hex::encode(msg.caller),
                pkg_path: msg.pkg_path,
                func: msg.func,
                args: msg.args,
                send: coins_string(&msg.send),
            }
        }
        TYPE_RUN => {
            let msg: AminoMsgRun = decode_value(&any)?;
            Message::Run {
                caller: hex::encode(msg.caller),
                package: package_or_default(msg.package),
            }
        }
        TYPE_SEND => {
            let msg: AminoMsgSend = decode_value(&any)?;
            Message::Send {
                from: hex::encode(msg.from_address),
                to: hex::encode(msg.to_address),
                amount: coins_string(&msg.amount),
            }
        }
        _ => Message::Unknown {
            type_url: any.type_url,
        },
    };
    Ok(msg)
}

/// Decodes the messages of a binary amino `std.Tx`.
///
/// Addresses come out hex encoded since the binary form carries raw bytes.
pub(crate) fn decode_binary_tx(raw: &[u8]) -> Result<Vec<Message>, ClientError> {
    let tx = AminoTx::decode(raw)
        .map_err(|e| ClientError::decode(format!("tx is not binary amino: {e}")))?;
    tx.msgs.into_iter().map(decode_any).collect()
}

/// Encodes a binary amino tx that deploys `package`.
#[cfg(any(test, feature = "test-utils"))]
pub fn binary_add_package_tx(creator: &[u8], package: &MemPackage) -> Tx {
    let msg = AminoMsgAddPackage {
        creator: creator.to_vec(),
        package: Some(package.into()),
        deposit: Vec::new(),
    };
    let tx = AminoTx {
        msgs: vec![AminoAny {
            type_url: TYPE_ADD_PACKAGE.to_string(),
            value: msg.encode_to_vec(),
        }],
    };
    Tx::new(tx.encode_to_vec())
}
