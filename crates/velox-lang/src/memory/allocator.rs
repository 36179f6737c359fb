//! First-fit block allocator over a fixed byte budget.

/// Bytes of bookkeeping charged in front of every block.
pub const BLOCK_HEADER: usize = 16;

const ALIGN: usize = 8;

/// A reserved region of the arena. `offset` is where the header starts;
/// `size` is the payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub offset: usize,
    pub size: usize,
}

impl Block {
    fn end(&self) -> usize {
        self.offset + BLOCK_HEADER + self.size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub budget: usize,
    pub live_allocations: usize,
    pub max_live_allocations: usize,
    pub total_allocations: usize,
    pub bytes_in_use: usize,
    pub max_bytes_in_use: usize,
    pub free_blocks: usize,
}

pub struct BlockAllocator {
    budget: usize,
    coalesce: bool,
    /// Head of the list is the end of the vec.
    free: Vec<Block>,
    stats: MemoryStats,
    failed: Option<usize>,
}

impl BlockAllocator {
    pub fn new(budget: usize, coalesce: bool) -> Self {
        let free = if budget > BLOCK_HEADER {
            vec![Block { offset: 0, size: budget - BLOCK_HEADER }]
        } else {
            Vec::new()
        };
        Self {
            budget,
            coalesce,
            free,
            stats: MemoryStats { budget, ..MemoryStats::default() },
            failed: None,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn failed_request(&self) -> Option<usize> {
        self.failed
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats { free_blocks: self.free.len(), ..self.stats.clone() }
    }

    pub fn allocate(&mut self, size: usize) -> Option<Block> {
        if self.failed.is_some() {
            return None;
        }
        let size = round_up(size);

        let block = if let Some(i) = self.free.iter().rposition(|b| b.size == size) {
            self.free.remove(i)
        } else if let Some(i) = self.free.iter().rposition(|b| b.size >= size + BLOCK_HEADER) {
            let host = self.free[i];
            self.free[i] = Block {
                offset: host.offset + BLOCK_HEADER + size,
                size: host.size - size - BLOCK_HEADER,
            };
            Block { offset: host.offset, size }
        } else {
            self.failed = Some(size);
            return None;
        };

        let s = &mut self.stats;
        s.live_allocations += 1;
        s.total_allocations += 1;
        s.bytes_in_use += block.size;
        s.max_live_allocations = s.max_live_allocations.max(s.live_allocations);
        s.max_bytes_in_use = s.max_bytes_in_use.max(s.bytes_in_use);
        Some(block)
    }

    pub fn free(&mut self, block: Block) {
        self.stats.live_allocations -= 1;
        self.stats.bytes_in_use -= block.size;

        if !self.coalesce {
            self.free.push(block);
            return;
        }

        // Kept sorted by offset so neighbours sit next to each other.
        let idx = self.free.partition_point(|b| b.offset < block.offset);
        self.free.insert(idx, block);
        if idx + 1 < self.free.len() && self.free[idx].end() == self.free[idx + 1].offset {
            let next = self.free.remove(idx + 1);
            self.free[idx].size += BLOCK_HEADER + next.size;
        }
        if idx > 0 && self.free[idx - 1].end() == self.free[idx].offset {
            let cur = self.free.remove(idx);
            self.free[idx - 1].size += BLOCK_HEADER + cur.size;
        }
    }
}

/// Payload size actually reserved for a request of `size` bytes.
pub fn round_up(size: usize) -> usize {
    size.max(1).div_ceil(ALIGN) * ALIGN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_rounded_to_alignment() {
        let mut a = BlockAllocator::new(1024, true);
        let b = a.allocate(3).unwrap();
        assert_eq!(b.size, 8);
        assert_eq!(a.stats().bytes_in_use, 8);
    }

    #[test]
    fn carving_leaves_header_for_leftover() {
        let mut a = BlockAllocator::new(256, false);
        let b = a.allocate(64).unwrap();
        assert_eq!(b, Block { offset: 0, size: 64 });
        let c = a.allocate(32).unwrap();
        assert_eq!(c.offset, BLOCK_HEADER + 64);
    }

    #[test]
    fn exact_size_block_is_reused() {
        let mut a = BlockAllocator::new(1024, false);
        let b = a.allocate(48).unwrap();
        let _c = a.allocate(16).unwrap();
        a.free(b);
        let d = a.allocate(48).unwrap();
        assert_eq!(d, b);
    }

    #[test]
    fn exhaustion_fails_and_poisons() {
        let mut a = BlockAllocator::new(128, true);
        assert!(a.allocate(200).is_none());
        assert_eq!(a.failed_request(), Some(200));
        assert!(a.allocate(8).is_none());
    }

    #[test]
    fn free_list_without_coalescing_fragments() {
        let mut a = BlockAllocator::new(16 + 3 * (BLOCK_HEADER + 32), false);
        let x = a.allocate(32).unwrap();
        let y = a.allocate(32).unwrap();
        let _z = a.allocate(16).unwrap();
        a.free(x);
        a.free(y);
        // Two adjacent 32-byte holes, but no single block can hold 64 bytes.
        assert!(a.allocate(64).is_none());
    }

    #[test]
    fn coalescing_merges_neighbours() {
        let mut a = BlockAllocator::new(16 + 3 * (BLOCK_HEADER + 32), true);
        let x = a.allocate(32).unwrap();
        let y = a.allocate(32).unwrap();
        let _z = a.allocate(16).unwrap();
        a.free(x);
        a.free(y);
        let merged = a.allocate(64).unwrap();
        assert_eq!(merged.offset, 0);
    }

    #[test]
    fn counters_track_peaks() {
        let mut a = BlockAllocator::new(4096, true);
        let b1 = a.allocate(100).unwrap();
        let b2 = a.allocate(100).unwrap();
        a.free(b1);
        a.free(b2);
        let s = a.stats();
        assert_eq!(s.live_allocations, 0);
        assert_eq!(s.max_live_allocations, 2);
        assert_eq!(s.total_allocations, 2);
        assert_eq!(s.bytes_in_use, 0);
        assert_eq!(s.max_bytes_in_use, 208);
        assert_eq!(s.free_blocks, 1);
    }
}
