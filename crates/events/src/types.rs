use serde::{Deserialize, Serialize};
use tokenscout_primitives::prelude::*;

/// Kinds of events subscribers can filter on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    /// A block and its transaction results were committed.
    NewBlock,
    /// A deployed package looks like a token contract.
    TokenDetected,
}

/// A deployed package whose exported functions match the token interface.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenCandidate {
    pub package_path: String,
    pub height: Height,
    pub creator: String,
    pub functions: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    NewBlock {
        block: Block,
        results: Vec<TxResult>,
    },
    TokenDetected(TokenCandidate),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::NewBlock { .. } => EventType::NewBlock,
            Event::TokenDetected(_) => EventType::TokenDetected,
        }
    }
}
