use alloc::vec::Vec;
use core::alloc::Layout;

use crate::chunk::Chunk;
use crate::error::ChunkedDequeError;

const MIN_MAP_CAPACITY: usize = 8;

/// Owning array of chunk handles.
///
/// Live chunks occupy the window `[first, first + len)` of `handles`, with
/// free handle slots on both sides so chunks can be attached at either end
/// without touching element storage. Chunk ids handed out to the deque are
/// relative to the window start: id 0 is always the head chunk.
///
/// Growth: when an end of the handle array is exhausted, the window is
/// re-centred in place if at most half of the array is used, otherwise the
/// array doubles. Shrink: once at most a quarter is used, the array halves.
pub(crate) struct ChunkMap<T, const K: usize> {
    handles: Vec<Option<Chunk<T, K>>>,
    first: usize,
    len: usize,
}

impl<T, const K: usize> ChunkMap<T, K> {
    pub(crate) const fn new() -> Self {
        Self {
            handles: Vec::new(),
            first: 0,
            len: 0,
        }
    }

    /// Number of live chunks.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of handle slots, used or not.
    pub(crate) fn capacity(&self) -> usize {
        self.handles.len()
    }

    /// # Panics
    ///
    /// Panics if `id` is not a live chunk id.
    #[allow(clippy::expect_used)]
    pub(crate) fn chunk(&self, id: usize) -> &Chunk<T, K> {
        assert!(id < self.len, "chunk id {id} out of range for {} chunks", self.len);
        self.handles[self.first + id]
            .as_ref()
            .expect("handles inside the live window are populated")
    }

    /// # Panics
    ///
    /// Panics if `id` is not a live chunk id.
    #[allow(clippy::expect_used)]
    pub(crate) fn chunk_mut(&mut self, id: usize) -> &mut Chunk<T, K> {
        assert!(id < self.len, "chunk id {id} out of range for {} chunks", self.len);
        self.handles[self.first + id]
            .as_mut()
            .expect("handles inside the live window are populated")
    }

    /// Attaches `chunk` after the last live chunk. Existing ids are unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ChunkedDequeError::AllocationFailed` or
    /// `ChunkedDequeError::CapacityOverflow` if the handle array had to grow
    /// and could not. The map is unchanged in that case.
    pub(crate) fn try_push_back(&mut self, chunk: Chunk<T, K>) -> Result<(), ChunkedDequeError> {
        if self.first + self.len == self.handles.len() {
            self.make_room()?;
        }
        self.handles[self.first + self.len] = Some(chunk);
        self.len += 1;
        _trace!(chunks = self.len, "attached tail chunk");
        Ok(())
    }

    /// Attaches `chunk` before the head chunk. Every existing id grows by one.
    ///
    /// # Errors
    ///
    /// Same as [`ChunkMap::try_push_back`].
    pub(crate) fn try_push_front(&mut self, chunk: Chunk<T, K>) -> Result<(), ChunkedDequeError> {
        if self.first == 0 {
            self.make_room()?;
        }
        self.first -= 1;
        self.handles[self.first] = Some(chunk);
        self.len += 1;
        _trace!(chunks = self.len, "attached head chunk");
        Ok(())
    }

    /// Detaches the last live chunk. The caller must have destroyed its values.
    ///
    /// May try to reallocate a sparse handle array at half size; if that
    /// allocation fails the larger array is kept.
    pub(crate) fn pop_back(&mut self) -> Option<Chunk<T, K>> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let chunk = self.handles[self.first + self.len].take();
        _trace!(chunks = self.len, "released tail chunk");
        self.shrink_if_sparse();
        chunk
    }

    /// Detaches the head chunk. Every remaining id shrinks by one.
    /// The caller must have destroyed its values.
    pub(crate) fn pop_front(&mut self) -> Option<Chunk<T, K>> {
        if self.len == 0 {
            return None;
        }
        let chunk = self.handles[self.first].take();
        self.first += 1;
        self.len -= 1;
        _trace!(chunks = self.len, "released head chunk");
        self.shrink_if_sparse();
        chunk
    }

    /// Releases every chunk. The caller must have destroyed their values.
    ///
    /// A handle array grown past the minimum is freed as well; the next
    /// attach starts over at the minimum capacity.
    pub(crate) fn clear(&mut self) {
        for handle in &mut self.handles[self.first..self.first + self.len] {
            *handle = None;
        }
        self.len = 0;
        if self.handles.len() > MIN_MAP_CAPACITY {
            self.handles = Vec::new();
        }
        self.first = self.handles.len() / 2;
    }

    fn make_room(&mut self) -> Result<(), ChunkedDequeError> {
        let capacity = self.handles.len();
        if self.len * 2 < capacity {
            self.recenter();
            Ok(())
        } else {
            self.relocate(capacity.saturating_mul(2).max(MIN_MAP_CAPACITY))
        }
    }

    fn recenter(&mut self) {
        let first = (self.handles.len() - self.len) / 2;
        if first < self.first {
            self.handles[first..self.first + self.len].rotate_left(self.first - first);
        } else if first > self.first {
            self.handles[self.first..first + self.len].rotate_right(first - self.first);
        }
        self.first = first;
        _trace!(first, capacity = self.handles.len(), "re-centred chunk map");
    }

    /// Moves the live window into a fresh handle array of `capacity` slots.
    fn relocate(&mut self, capacity: usize) -> Result<(), ChunkedDequeError> {
        debug_assert!(capacity > self.len);
        let layout = Layout::array::<Option<Chunk<T, K>>>(capacity)
            .map_err(|_| ChunkedDequeError::CapacityOverflow { slots: capacity })?;

        let mut handles = Vec::new();
        handles
            .try_reserve_exact(capacity)
            .map_err(|_| ChunkedDequeError::AllocationFailed { layout })?;
        handles.resize_with(capacity, || None);

        let first = (capacity - self.len) / 2;
        let live = self.handles.drain(self.first..self.first + self.len);
        for (slot, handle) in handles[first..first + self.len].iter_mut().zip(live) {
            *slot = handle;
        }

        self.handles = handles;
        self.first = first;
        _trace!(capacity, "relocated chunk map");
        Ok(())
    }

    fn shrink_if_sparse(&mut self) {
        let capacity = self.handles.len();
        if capacity > MIN_MAP_CAPACITY && self.len * 4 <= capacity {
            // Shrinking is best effort; keep the larger array if it fails.
            let _ = self.relocate((capacity / 2).max(MIN_MAP_CAPACITY));
        }
    }
}
