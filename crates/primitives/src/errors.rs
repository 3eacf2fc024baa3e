//! Errors during construction of primitives.

use thiserror::Error;

use crate::Height;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum ChunkRangeError {
    #[error("invalid chunk range: from {from} is above to {to}")]
    Inverted { from: Height, to: Height },

    #[error("invalid chunk range: height 0 is never part of a chain")]
    Genesis,
}
