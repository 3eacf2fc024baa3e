//! Transaction message decoding.

use serde::Deserialize;
use serde_json::Value;
use tokenscout_primitives::prelude::*;

use crate::{amino::decode_binary_tx, ClientError};

/// Turns raw transaction bytes into the messages they carry.
pub trait TxDecoder: Send + Sync + 'static {
    fn decode(&self, tx: &Tx) -> Result<Vec<Message>, ClientError>;
}

/// Decodes transactions published in amino JSON form.
///
/// Message kinds other than the ones in [`Message`] decode to [`Message::Unknown`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AminoJsonDecoder;

/// Decodes transactions as the node stores them, in binary amino, and falls back to
/// [`AminoJsonDecoder`] for payloads that are a JSON object.
#[derive(Debug, Default, Clone, Copy)]
pub struct AminoDecoder;

pub(crate) const TYPE_ADD_PACKAGE: &str = "/vm.m_addpkg";
pub(crate) const TYPE_CALL: &str = "/vm.m_call";
pub(crate) const TYPE_RUN: &str = "/vm.m_run";
pub(crate) const TYPE_SEND: &str = "/bank.MsgSend";

#[derive(Debug, Deserialize)]
struct WireTx {
    msg: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct WirePackage {
    #[serde(default)]
    name: String,
    path: String,
    files: Option<Vec<MemFile>>,
}

impl From<WirePackage> for MemPackage {
    fn from(value: WirePackage) -> Self {
        MemPackage {
            name: value.name,
            path: value.path,
            files: value.files.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "@type")]
enum WireMsg {
    #[serde(rename = "/vm.m_addpkg")]
    AddPackage {
        creator: String,
        package: WirePackage,
        #[serde(default)]
        deposit: String,
    },

    #[serde(rename = "/vm.m_call")]
    Call {
        caller: String,
        #[serde(default)]
        send: String,
        pkg_path: String,
        func: String,
        args: Option<Vec<String>>,
    },

    #[serde(rename = "/vm.m_run")]
    Run {
        caller: String,
        package: WirePackage,
    },

    #[serde(rename = "/bank.MsgSend")]
    Send {
        from_address: String,
        to_address: String,
        amount: String,
    },
}

impl From<WireMsg> for Message {
    fn from(value: WireMsg) -> Self {
        match value {
            WireMsg::AddPackage {
                creator,
                package,
                deposit,
            } => Message::AddPackage {
                creator,
                package: package.into(),
                deposit,
            },
            WireMsg::Call {
                caller,
                send,
                pkg_path,
                func,
                args,
            } => Message::Call {
                caller,
                pkg_path,
                func,
                args: args.unwrap_or_default(),
                send,
            },
            WireMsg::Run { caller, package } => Message::Run {
                caller,
                package: package.into(),
            },
            WireMsg::Send {
                from_address,
                to_address,
                amount,
            } => Message::Send {
                from: from_address,
                to: to_address,
                amount,
            },
        }
    }
}

fn decode_msg(value: Value) -> Result<Message, ClientError> {
    let type_url = value
        .get("@type")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::decode("message without @type"))?
        .to_owned();

    match type_url.as_str() {
        TYPE_ADD_PACKAGE | TYPE_CALL | TYPE_RUN | TYPE_SEND => {
            let msg: WireMsg = serde_json::from_value(value)
                .map_err(|e| ClientError::decode(format!("{type_url}: {e}")))?;
            Ok(msg.into())
        }
        _ => Ok(Message::Unknown { type_url }),
    }
}

impl TxDecoder for AminoJsonDecoder {
    fn decode(&self, tx: &Tx) -> Result<Vec<Message>, ClientError> {
        let wire: WireTx = serde_json::from_slice(tx.as_bytes())
            .map_err(|e| ClientError::decode(format!("tx is not amino JSON: {e}")))?;
        wire.msg
            .unwrap_or_default()
            .into_iter()
            .map(decode_msg)
            .collect()
    }
}

impl TxDecoder for AminoDecoder {
    fn decode(&self, tx: &Tx) -> Result<Vec<Message>, ClientError> {
        // A binary tx starts with the tag of its first field, never with `{`.
        match tx.as_bytes().iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => AminoJsonDecoder.decode(tx),
            _ => decode_binary_tx(tx.as_bytes()),
        }
    }
}
