use core::alloc::Layout;

use thiserror::Error;

/// Error types for `ChunkedDeque` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ChunkedDequeError {
    /// Index is beyond the current deque length
    #[error("Index out of bounds: index {index} is beyond deque length {length}")]
    IndexOutOfBounds {
        /// Index that was accessed
        index: usize,
        /// Current length of the deque
        length: usize,
    },
    /// The allocator returned no memory for a chunk or for the chunk map
    #[error("Allocation failed: {} bytes with alignment {} requested", .layout.size(), .layout.align())]
    AllocationFailed {
        /// Layout that could not be allocated
        layout: Layout,
    },
    /// The requested number of slots does not fit in the address space
    #[error("Capacity overflow: {slots} slots exceed the maximum allocation size")]
    CapacityOverflow {
        /// Number of slots requested
        slots: usize,
    },
}
