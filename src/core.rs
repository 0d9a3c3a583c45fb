use alloc::alloc::handle_alloc_error;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

use crate::chunk::Chunk;
use crate::cursor::Cursor;
use crate::error::ChunkedDequeError;
use crate::iter::{IntoIter, Iter, IterMut, RandomAccessIter, ReadOnly, ReadWrite};
use crate::map::ChunkMap;

/// Slots per chunk when `K` is not given.
pub const DEFAULT_CHUNK_CAPACITY: usize = 16;

/// A double-ended queue stored in fixed-size chunks of `K` slots.
///
/// Live values occupy the slots from the head cursor (inclusive) to the tail
/// cursor (exclusive). Logical index `i` lives in chunk
/// `(head_slot + i) / K`, slot `(head_slot + i) % K`, counting chunks from
/// the head chunk.
///
/// Chunks are attached only when a push finds no free slot at its end and are
/// released as soon as a pop leaves them without live values. Values never
/// move between slots once constructed.
///
/// The deque is not synchronized; sharing it across threads requires the
/// usual `Send`/`Sync` bounds and external locking for mutation.
pub struct ChunkedDeque<T, const K: usize = { DEFAULT_CHUNK_CAPACITY }> {
    map: ChunkMap<T, K>,
    head: Cursor,
    tail: Cursor,
    _owns: PhantomData<T>,
}

impl<T, const K: usize> ChunkedDeque<T, K> {
    /// Creates an empty deque. No chunk is allocated until the first push.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: ChunkMap::new(),
            head: Cursor::new(0, 0),
            tail: Cursor::new(0, 0),
            _owns: PhantomData,
        }
    }

    /// Creates a deque of `count` values produced by `f(0)`, `f(1)`, ...
    ///
    /// Values are laid out from slot 0 of the first chunk.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`. Every value produced before it
    /// is dropped and every chunk released before returning.
    pub fn try_from_fn<E, F>(count: usize, mut f: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        // Unpublished until complete: an early return drops it, which destroys
        // the values built so far and frees their chunks.
        let mut deque = Self::new();
        for index in 0..count {
            deque.push_back(f(index)?);
        }
        Ok(deque)
    }

    /// Creates a deque of `count` clones of `value`.
    ///
    /// If a clone panics, the values cloned so far are dropped and their
    /// chunks released while unwinding.
    #[must_use]
    pub fn from_elem(count: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut deque = Self::new();
        for _ in 0..count {
            deque.push_back(value.clone());
        }
        deque
    }

    /// Creates a deque of `count` default values.
    #[must_use]
    pub fn with_len(count: usize) -> Self
    where
        T: Default,
    {
        let mut deque = Self::new();
        for _ in 0..count {
            deque.push_back(T::default());
        }
        deque
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tail.linear::<K>() - self.head.linear::<K>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of chunks currently allocated.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.map.len()
    }

    /// Slots per chunk (`K`).
    #[must_use]
    pub const fn chunk_capacity(&self) -> usize {
        K
    }

    pub(crate) fn head_position(&self) -> usize {
        self.head.linear::<K>()
    }

    pub(crate) fn tail_position(&self) -> usize {
        self.tail.linear::<K>()
    }

    /// Value at a linear position, if it lies between the cursors.
    #[allow(unsafe_code)]
    pub(crate) fn position(&self, position: usize) -> Option<&T> {
        if !(self.head_position()..self.tail_position()).contains(&position) {
            return None;
        }
        let at = Cursor::from_linear::<K>(position);
        // SAFETY: positions between the cursors hold live values.
        Some(unsafe { self.map.chunk(at.chunk).get(at.slot) })
    }

    #[allow(unsafe_code)]
    pub(crate) fn position_mut(&mut self, position: usize) -> Option<&mut T> {
        if !(self.head_position()..self.tail_position()).contains(&position) {
            return None;
        }
        let at = Cursor::from_linear::<K>(position);
        // SAFETY: positions between the cursors hold live values.
        Some(unsafe { self.map.chunk_mut(at.chunk).get_mut(at.slot) })
    }

    /// Returns a reference to the value at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        self.position(self.head_position() + index)
    }

    /// Returns a mutable reference to the value at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        let position = self.head_position() + index;
        self.position_mut(position)
    }

    /// Returns a reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ChunkedDequeError::IndexOutOfBounds` if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, ChunkedDequeError> {
        let length = self.len();
        self.get(index)
            .ok_or(ChunkedDequeError::IndexOutOfBounds { index, length })
    }

    /// Returns a mutable reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ChunkedDequeError::IndexOutOfBounds` if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, ChunkedDequeError> {
        let length = self.len();
        self.get_mut(index)
            .ok_or(ChunkedDequeError::IndexOutOfBounds { index, length })
    }

    /// Returns a reference to the value at `index` without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len()`.
    #[must_use]
    #[allow(unsafe_code)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        let at = Cursor::from_linear::<K>(self.head_position() + index);
        self.map.chunk(at.chunk).get(at.slot)
    }

    /// Returns a mutable reference to the value at `index` without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len()`.
    #[must_use]
    #[allow(unsafe_code)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        let at = Cursor::from_linear::<K>(self.head_position() + index);
        self.map.chunk_mut(at.chunk).get_mut(at.slot)
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len().checked_sub(1)?;
        self.get_mut(last)
    }

    /// Appends a value at the back.
    ///
    /// # Errors
    ///
    /// Returns `ChunkedDequeError::AllocationFailed` or
    /// `ChunkedDequeError::CapacityOverflow` if a new chunk was needed and
    /// could not be allocated. The deque is unchanged and `value` is dropped.
    #[allow(unsafe_code)]
    pub fn try_push_back(&mut self, value: T) -> Result<(), ChunkedDequeError> {
        if self.map.is_empty() {
            self.map.try_push_back(Chunk::try_new()?)?;
            self.head = Cursor::new(0, 0);
            self.tail = Cursor::new(0, 0);
        } else if self.tail.slot == K {
            self.map.try_push_back(Chunk::try_new()?)?;
            self.tail = Cursor::new(self.tail.chunk + 1, 0);
        }

        // SAFETY: the tail slot lies past the last live value.
        unsafe {
            self.map
                .chunk_mut(self.tail.chunk)
                .construct(self.tail.slot, value);
        }
        self.tail.slot += 1;
        Ok(())
    }

    /// Prepends a value at the front.
    ///
    /// # Errors
    ///
    /// Same as [`ChunkedDeque::try_push_back`].
    #[allow(unsafe_code)]
    pub fn try_push_front(&mut self, value: T) -> Result<(), ChunkedDequeError> {
        if self.map.is_empty() {
            // Fill the first chunk downward so later front pushes reuse it.
            self.map.try_push_back(Chunk::try_new()?)?;
            self.head = Cursor::new(0, K);
            self.tail = Cursor::new(0, K);
        } else if self.head.slot == 0 {
            self.map.try_push_front(Chunk::try_new()?)?;
            // The new chunk takes id 0; the old ones move up by one.
            self.tail.chunk += 1;
            self.head = Cursor::new(self.head.chunk, K);
        }

        self.head.slot -= 1;
        // SAFETY: the slot just below the old head held no live value.
        unsafe {
            self.map
                .chunk_mut(self.head.chunk)
                .construct(self.head.slot, value);
        }
        Ok(())
    }

    /// Appends a value at the back.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow; aborts through `handle_alloc_error` if the
    /// allocator fails.
    pub fn push_back(&mut self, value: T) {
        infallible(self.try_push_back(value));
    }

    /// Prepends a value at the front.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow; aborts through `handle_alloc_error` if the
    /// allocator fails.
    pub fn push_front(&mut self, value: T) {
        infallible(self.try_push_front(value));
    }

    /// Removes and returns the last value. Returns `None` if the deque is empty.
    ///
    /// Releases the tail chunk once it holds no live value. Releasing a chunk
    /// may reallocate a sparse chunk map at half size; that allocation is
    /// best effort and a failure keeps the larger map, so popping never fails.
    #[allow(unsafe_code)]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        self.tail.slot -= 1;
        // SAFETY: the slot below the tail cursor holds the last live value.
        let value = unsafe { self.map.chunk_mut(self.tail.chunk).take(self.tail.slot) };

        if self.is_empty() {
            self.release_all();
        } else if self.tail.slot == 0 {
            drop(self.map.pop_back());
            self.tail = Cursor::new(self.tail.chunk - 1, K);
        }
        Some(value)
    }

    /// Removes and returns the first value. Returns `None` if the deque is empty.
    ///
    /// Releases the head chunk once it holds no live value. Like
    /// [`ChunkedDeque::pop_back`], this may attempt a best-effort shrink of the
    /// chunk map.
    #[allow(unsafe_code)]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: the head cursor addresses the first live value.
        let value = unsafe { self.map.chunk_mut(self.head.chunk).take(self.head.slot) };
        self.head.slot += 1;

        if self.head.linear::<K>() == self.tail.linear::<K>() {
            self.release_all();
        } else if self.head.slot == K {
            drop(self.map.pop_front());
            // Remaining chunks move down by one id.
            self.tail.chunk -= 1;
            self.head = Cursor::new(self.head.chunk, 0);
        }
        Some(value)
    }

    /// Drops every value in logical order and releases every chunk.
    ///
    /// If a destructor panics, the remaining values are still dropped and
    /// every chunk released before the panic propagates.
    pub fn clear(&mut self) {
        let (head, tail) = (self.head, self.tail);
        self.head = Cursor::new(0, 0);
        self.tail = Cursor::new(0, 0);

        let mut dropper = Dropper {
            map: &mut self.map,
            head,
            tail,
            next: head.chunk,
        };
        dropper.destroy_remaining();
    }

    fn release_all(&mut self) {
        self.map.clear();
        self.head = Cursor::new(0, 0);
        self.tail = Cursor::new(0, 0);
    }

    /// Read-only random-access iterator at the first value.
    #[must_use]
    pub fn begin(&self) -> Iter<'_, T, K> {
        RandomAccessIter::<T, ReadOnly, K>::new(self, self.head_position(), self.tail_position())
    }

    /// Read-only random-access iterator one past the last value.
    ///
    /// Never dereferenceable; `get()` on it returns `None`.
    #[must_use]
    pub fn end(&self) -> Iter<'_, T, K> {
        RandomAccessIter::<T, ReadOnly, K>::new(self, self.tail_position(), self.tail_position())
    }

    /// Read-write random-access iterator at the first value.
    #[must_use]
    pub fn begin_mut(&mut self) -> RandomAccessIter<'_, T, ReadWrite, K> {
        let (head, tail) = (self.head_position(), self.tail_position());
        RandomAccessIter::<T, ReadWrite, K>::new(self, head, tail)
    }

    /// Read-write random-access iterator one past the last value.
    #[must_use]
    pub fn end_mut(&mut self) -> RandomAccessIter<'_, T, ReadWrite, K> {
        let tail = self.tail_position();
        RandomAccessIter::<T, ReadWrite, K>::new(self, tail, tail)
    }

    /// Returns an iterator over the values from front to back.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T, K> {
        self.begin()
    }

    /// Returns an iterator over mutable references from front to back.
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, K> {
        let (head, tail) = (self.head_position(), self.tail_position());
        IterMut::new(&self.map, head, tail)
    }
}

/// Destroys the values between two old cursors chunk by chunk, then
/// releases every chunk. Runs to completion on unwind too.
struct Dropper<'a, T, const K: usize> {
    map: &'a mut ChunkMap<T, K>,
    head: Cursor,
    tail: Cursor,
    next: usize,
}

impl<T, const K: usize> Dropper<'_, T, K> {
    #[allow(unsafe_code)]
    fn destroy_remaining(&mut self) {
        let last = self.map.len().min(self.tail.chunk + 1);
        while self.next < last {
            let id = self.next;
            // Advance first: a panicking destructor must not see this chunk again.
            self.next += 1;
            let start = if id == self.head.chunk { self.head.slot } else { 0 };
            let end = if id == self.tail.chunk { self.tail.slot } else { K };
            // SAFETY: the slots between the old cursors held live values and
            // each chunk is visited once.
            unsafe { self.map.chunk_mut(id).destroy(start..end) };
        }
    }
}

impl<T, const K: usize> Drop for Dropper<'_, T, K> {
    fn drop(&mut self) {
        self.destroy_remaining();
        self.map.clear();
    }
}

fn infallible(result: Result<(), ChunkedDequeError>) {
    match result {
        Ok(()) => {}
        Err(ChunkedDequeError::AllocationFailed { layout }) => handle_alloc_error(layout),
        Err(err) => panic!("{err}"),
    }
}

impl<T, const K: usize> Drop for ChunkedDeque<T, K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, const K: usize> Default for ChunkedDeque<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const K: usize> Clone for ChunkedDeque<T, K> {
    /// Copies every value into a fresh set of chunks laid out from slot 0.
    ///
    /// If a value's `clone` panics, the copies made so far are dropped and
    /// their chunks released while unwinding; `self` is untouched.
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        for value in self {
            copy.push_back(value.clone());
        }
        copy
    }

    /// Replaces `self` with a copy of `source`.
    ///
    /// The copy is built completely before the old contents are dropped, so a
    /// panicking `clone` leaves `self` as it was.
    fn clone_from(&mut self, source: &Self) {
        let copy = source.clone();
        *self = copy;
    }
}

impl<T: fmt::Debug, const K: usize> fmt::Debug for ChunkedDeque<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const K: usize> PartialEq for ChunkedDeque<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && Iterator::eq(self.iter(), other.iter())
    }
}

impl<T: Eq, const K: usize> Eq for ChunkedDeque<T, K> {}

impl<T, const K: usize> Index<usize> for ChunkedDeque<T, K> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "Index {} out of bounds for deque of length {}",
                index,
                self.len()
            ),
        }
    }
}

impl<T, const K: usize> IndexMut<usize> for ChunkedDeque<T, K> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let length = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("Index {index} out of bounds for deque of length {length}"),
        }
    }
}

impl<T, const K: usize> Extend<T> for ChunkedDeque<T, K> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T, const K: usize> FromIterator<T> for ChunkedDeque<T, K> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T, const K: usize> IntoIterator for ChunkedDeque<T, K> {
    type Item = T;
    type IntoIter = IntoIter<T, K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, const K: usize> IntoIterator for &'a ChunkedDeque<T, K> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const K: usize> IntoIterator for &'a mut ChunkedDeque<T, K> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
