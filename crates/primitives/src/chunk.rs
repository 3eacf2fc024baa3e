use std::{collections::HashMap, fmt, ops::RangeInclusive};

use crate::{
    block::{Block, TxResult},
    errors::ChunkRangeError,
    Height,
};

/// Inclusive range of heights fetched and committed as one unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChunkRange {
    from: Height,
    to: Height,
}

impl ChunkRange {
    pub fn new(from: Height, to: Height) -> Result<Self, ChunkRangeError> {
        if from == 0 {
            return Err(ChunkRangeError::Genesis);
        }
        if from > to {
            return Err(ChunkRangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> Height {
        self.from
    }

    pub fn to(&self) -> Height {
        self.to
    }

    /// Number of heights covered, always at least one.
    pub fn len(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Always `false`, a range covers at least one height.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, height: Height) -> bool {
        (self.from..=self.to).contains(&height)
    }

    pub fn heights(&self) -> RangeInclusive<Height> {
        self.from..=self.to
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Blocks and execution results retrieved for one [`ChunkRange`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FetchedChunk {
    blocks: Vec<Block>,
    results: HashMap<Height, Vec<TxResult>>,
}

impl FetchedChunk {
    pub fn new(blocks: Vec<Block>, results: HashMap<Height, Vec<TxResult>>) -> Self {
        Self { blocks, results }
    }

    /// Blocks in ascending height order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Execution results of the block at `height`, empty when none were fetched.
    pub fn results_at(&self, height: Height) -> &[TxResult] {
        self.results.get(&height).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_parts(self) -> (Vec<Block>, HashMap<Height, Vec<TxResult>>) {
        (self.blocks, self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_range_bounds() {
        let range = ChunkRange::new(101, 200).unwrap();
        assert_eq!(range.len(), 100);
        assert!(range.contains(101));
        assert!(range.contains(200));
        assert!(!range.contains(201));
        assert_eq!(range.heights().count(), 100);
        assert_eq!(range.to_string(), "[101, 200]");

        let single = ChunkRange::new(7, 7).unwrap();
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
    }

    #[test]
    fn test_chunk_range_rejects_invalid() {
        assert_eq!(
            ChunkRange::new(10, 9),
            Err(ChunkRangeError::Inverted { from: 10, to: 9 })
        );
        assert_eq!(ChunkRange::new(0, 9), Err(ChunkRangeError::Genesis));
        assert_eq!(ChunkRange::new(7, 7).unwrap().len(), 1);
    }
}
