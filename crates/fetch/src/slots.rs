//! Order-preserving reassembly of out-of-order chunk completions.

use std::collections::VecDeque;

use tokenscout_primitives::prelude::*;

/// A reserved range and, once its worker reported back, the fetched chunk.
#[derive(Debug)]
pub struct Slot {
    range: ChunkRange,
    chunk: Option<FetchedChunk>,
    failed_attempts: u32,
}

impl Slot {
    fn new(range: ChunkRange) -> Self {
        Self {
            range,
            chunk: None,
            failed_attempts: 0,
        }
    }

    pub fn range(&self) -> ChunkRange {
        self.range
    }

    pub fn chunk(&self) -> Option<&FetchedChunk> {
        self.chunk.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.chunk.is_some()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }
}

/// Ordered sequence of reserved slots, bounded by `max_slots`.
///
/// Ranges are appended in ascending order and never overlap, so the sequence stays
/// sorted by `from` and lookups are binary searches. Slots leave only from the front,
/// and only once filled, which makes the pop order the height order.
#[derive(Debug)]
pub struct SlotBuffer {
    slots: VecDeque<Slot>,
    max_slots: usize,
}

impl SlotBuffer {
    pub fn new(max_slots: usize) -> Self {
        let max_slots = max_slots.max(1);
        Self {
            slots: VecDeque::with_capacity(max_slots),
            max_slots,
        }
    }

    /// Splits `[from, to]` into consecutive ranges of at most `max_chunk_size` heights and
    /// reserves as many as the free capacity allows, returning the reserved ranges.
    pub fn reserve_ranges(
        &mut self,
        from: Height,
        to: Height,
        max_chunk_size: u64,
    ) -> Vec<ChunkRange> {
        let mut reserved = Vec::new();
        if from > to || max_chunk_size == 0 {
            return reserved;
        }

        let mut start = from;
        while !self.is_full() {
            let end = start.saturating_add(max_chunk_size - 1).min(to);
            let Ok(range) = ChunkRange::new(start, end) else {
                break;
            };
            debug_assert!(self.next_height().map_or(true, |next| range.from() >= next));

            self.slots.push_back(Slot::new(range));
            reserved.push(range);

            if end == to {
                break;
            }
            start = end + 1;
        }

        reserved
    }

    /// Fills the slot starting at `from`. Filling twice overwrites.
    ///
    /// Returns `false` if no reserved slot starts at `from`.
    pub fn set_chunk(&mut self, from: Height, chunk: FetchedChunk) -> bool {
        match self.position(from) {
            Some(idx) => {
                self.slots[idx].chunk = Some(chunk);
                true
            }
            None => false,
        }
    }

    /// Counts a failed fetch of the slot starting at `from`, returning the failures so far.
    pub fn record_failure(&mut self, from: Height) -> Option<u32> {
        let idx = self.position(from)?;
        let slot = &mut self.slots[idx];
        slot.failed_attempts += 1;
        Some(slot.failed_attempts)
    }

    pub fn front(&self) -> Option<&Slot> {
        self.slots.front()
    }

    /// Removes the front slot, only if its chunk has arrived.
    pub fn pop_front(&mut self) -> Option<(ChunkRange, FetchedChunk)> {
        if !self.front()?.is_ready() {
            return None;
        }
        let slot = self.slots.pop_front()?;
        slot.chunk.map(|chunk| (slot.range, chunk))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.max_slots
    }

    pub fn free_slots(&self) -> usize {
        self.max_slots.saturating_sub(self.slots.len())
    }

    /// First height after the last reserved range.
    pub fn next_height(&self) -> Option<Height> {
        self.slots.back().map(|slot| slot.range.to().saturating_add(1))
    }

    fn position(&self, from: Height) -> Option<usize> {
        self.slots
            .binary_search_by_key(&from, |slot| slot.range.from())
            .ok()
    }
}
