//! Block allocator backing every Item and State.
//!
//! The arena is an accounting model: payload storage comes from the platform
//! allocator, but every allocation must first obtain a block from a fixed
//! byte budget. Exhausting the budget poisons the heap, and the interpreter
//! stops at the next statement boundary.

mod allocator;

pub use allocator::{round_up, Block, BlockAllocator, MemoryStats, BLOCK_HEADER};

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to one interpreter's arena.
#[derive(Clone)]
pub struct Heap(Rc<RefCell<BlockAllocator>>);

impl Heap {
    pub fn new(budget: usize, coalesce: bool) -> Self {
        Self(Rc::new(RefCell::new(BlockAllocator::new(budget, coalesce))))
    }

    /// Reserve `size` bytes. `None` means the arena is exhausted; the
    /// condition is sticky and reported by `is_exhausted`.
    pub fn allocate(&self, size: usize) -> Option<Block> {
        let mut arena = self.0.borrow_mut();
        let block = arena.allocate(size);
        if block.is_none() {
            tracing::error!(
                requested = size,
                budget = arena.budget(),
                in_use = arena.stats().bytes_in_use,
                "velox arena exhausted"
            );
        }
        block
    }

    pub fn free(&self, block: Block) {
        self.0.borrow_mut().free(block);
    }

    pub fn stats(&self) -> MemoryStats {
        self.0.borrow().stats()
    }

    pub fn budget(&self) -> usize {
        self.0.borrow().budget()
    }

    pub fn is_exhausted(&self) -> bool {
        self.0.borrow().failed_request().is_some()
    }

    /// Size of the request that exhausted the arena, if any.
    pub fn failed_request(&self) -> Option<usize> {
        self.0.borrow().failed_request()
    }

    pub fn ptr_eq(&self, other: &Heap) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Heap").field(&self.stats()).finish()
    }
}

/// An accounted allocation that returns its block to the heap on drop.
pub struct Allocation {
    heap: Heap,
    block: Option<Block>,
}

impl Allocation {
    pub fn new(heap: &Heap, size: usize) -> Self {
        Self { heap: heap.clone(), block: heap.allocate(size) }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn size(&self) -> usize {
        self.block.map_or(0, |b| b.size)
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.heap.free(block);
        }
    }
}
