/// A `(chunk, slot)` pair addressing one slot of the deque's storage.
///
/// Chunk ids are relative to the first live chunk. The linear value
/// `chunk * K + slot` orders cursors and converts them back and forth
/// from logical positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) chunk: usize,
    pub(crate) slot: usize,
}

impl Cursor {
    pub(crate) const fn new(chunk: usize, slot: usize) -> Self {
        Self { chunk, slot }
    }

    /// Splits a linear position into its chunk id and slot.
    pub(crate) const fn from_linear<const K: usize>(position: usize) -> Self {
        Self {
            chunk: position / K,
            slot: position % K,
        }
    }

    /// Returns `chunk * K + slot`.
    ///
    /// A tail cursor at `slot == K` and the cursor at slot 0 of the next
    /// chunk share the same linear value.
    pub(crate) const fn linear<const K: usize>(self) -> usize {
        self.chunk * K + self.slot
    }
}
