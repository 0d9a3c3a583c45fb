use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use crate::core::ChunkedDeque;
use crate::cursor::Cursor;
use crate::map::ChunkMap;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Element visibility of a [`RandomAccessIter`].
///
/// Implemented only by [`ReadOnly`] and [`ReadWrite`]. The capability picks
/// which borrow of the deque the iterator holds; position arithmetic is the
/// same for both.
pub trait Access: sealed::Sealed {
    /// Borrow of the deque held by the iterator.
    type Handle<'a, T: 'a, const K: usize>;

    #[doc(hidden)]
    fn view<'s, 'a: 's, T: 'a, const K: usize>(
        handle: &'s Self::Handle<'a, T, K>,
    ) -> &'s ChunkedDeque<T, K>;
}

/// Shared access: the iterator is `Copy` and yields `&T`.
#[derive(Debug)]
pub enum ReadOnly {}

/// Exclusive access: the iterator hands out `&mut T` through [`RandomAccessIter::get_mut`].
#[derive(Debug)]
pub enum ReadWrite {}

impl sealed::Sealed for ReadOnly {}
impl sealed::Sealed for ReadWrite {}

impl Access for ReadOnly {
    type Handle<'a, T: 'a, const K: usize> = &'a ChunkedDeque<T, K>;

    fn view<'s, 'a: 's, T: 'a, const K: usize>(
        handle: &'s Self::Handle<'a, T, K>,
    ) -> &'s ChunkedDeque<T, K> {
        handle
    }
}

impl Access for ReadWrite {
    type Handle<'a, T: 'a, const K: usize> = &'a mut ChunkedDeque<T, K>;

    fn view<'s, 'a: 's, T: 'a, const K: usize>(
        handle: &'s Self::Handle<'a, T, K>,
    ) -> &'s ChunkedDeque<T, K> {
        handle
    }
}

/// Random-access iterator over a [`ChunkedDeque`].
///
/// Holds a borrow of the deque plus a linear position `chunk * K + slot`.
/// Offsets re-derive `(chunk, slot)` by division, so stepping across a chunk
/// boundary carries into the next chunk (or borrows from the previous one)
/// exactly like `n` single steps would. Comparison and difference use the
/// linear position.
///
/// Valid positions run from `begin()` to `end()` inclusive; moving outside
/// that range panics. `end()` is never dereferenceable.
///
/// The borrow keeps the deque from being pushed to or popped from while the
/// iterator is alive, so an iterator can never observe a released chunk.
///
/// The read-only variant also implements [`Iterator`] and
/// [`DoubleEndedIterator`] over the values between its position and the end.
pub struct RandomAccessIter<'a, T: 'a, A: Access, const K: usize> {
    deque: A::Handle<'a, T, K>,
    position: usize,
    back: usize,
}

/// Read-only iterator returned by [`ChunkedDeque::iter`] and [`ChunkedDeque::begin`].
pub type Iter<'a, T, const K: usize> = RandomAccessIter<'a, T, ReadOnly, K>;

impl<'a, T: 'a, A: Access, const K: usize> RandomAccessIter<'a, T, A, K> {
    pub(crate) fn new(deque: A::Handle<'a, T, K>, position: usize, back: usize) -> Self {
        Self {
            deque,
            position,
            back,
        }
    }

    fn deque(&self) -> &ChunkedDeque<T, K> {
        A::view(&self.deque)
    }

    /// The value at the current position, or `None` at `end()`.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.deque().position(self.position)
    }

    /// Logical index of the current position (0 at `begin()`, `len()` at `end()`).
    #[must_use]
    pub fn index(&self) -> usize {
        self.position - self.deque().head_position()
    }

    /// Chunk id of the current position, counted from the head chunk.
    #[must_use]
    pub fn chunk(&self) -> usize {
        Cursor::from_linear::<K>(self.position).chunk
    }

    /// Slot of the current position within its chunk.
    #[must_use]
    pub fn slot(&self) -> usize {
        Cursor::from_linear::<K>(self.position).slot
    }

    /// Steps forward by one slot.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is at `end()`.
    pub fn inc(&mut self) {
        self.advance(1);
    }

    /// Steps back by one slot.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is at `begin()`.
    pub fn dec(&mut self) {
        self.advance(-1);
    }

    /// Moves the iterator by `offset` slots.
    ///
    /// # Panics
    ///
    /// Panics if the new position falls outside `begin()..=end()`.
    pub fn advance(&mut self, offset: isize) {
        let deque = self.deque();
        let valid = deque.head_position()..=deque.tail_position();
        let length = deque.len();
        match self.position.checked_add_signed(offset) {
            Some(position) if valid.contains(&position) => self.position = position,
            _ => panic!("Iterator offset {offset} out of range for deque of length {length}"),
        }
    }

    /// Signed number of slots from `origin` to `self`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn offset_from(&self, origin: &Self) -> isize {
        self.position as isize - origin.position as isize
    }
}

impl<'a, T: 'a, const K: usize> RandomAccessIter<'a, T, ReadWrite, K> {
    /// Mutable access to the value at the current position, or `None` at `end()`.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let position = self.position;
        self.deque.position_mut(position)
    }

    /// Converts the iterator into a mutable reference to its current value.
    #[must_use]
    pub fn into_mut(self) -> Option<&'a mut T> {
        let deque: &'a mut ChunkedDeque<T, K> = self.deque;
        deque.position_mut(self.position)
    }
}

impl<T, const K: usize> Clone for RandomAccessIter<'_, T, ReadOnly, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const K: usize> Copy for RandomAccessIter<'_, T, ReadOnly, K> {}

impl<'a, T: 'a, A: Access, const K: usize> fmt::Debug for RandomAccessIter<'a, T, A, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomAccessIter")
            .field("chunk", &self.chunk())
            .field("slot", &self.slot())
            .field("index", &self.index())
            .finish()
    }
}

impl<'a, T: 'a, A: Access, const K: usize> AddAssign<isize> for RandomAccessIter<'a, T, A, K> {
    fn add_assign(&mut self, offset: isize) {
        self.advance(offset);
    }
}

impl<'a, T: 'a, A: Access, const K: usize> SubAssign<isize> for RandomAccessIter<'a, T, A, K> {
    fn sub_assign(&mut self, offset: isize) {
        match offset.checked_neg() {
            Some(negated) => self.advance(negated),
            None => panic!("Iterator offset -({offset}) overflows isize"),
        }
    }
}

impl<'a, T: 'a, A: Access, const K: usize> Add<isize> for RandomAccessIter<'a, T, A, K> {
    type Output = Self;

    fn add(mut self, offset: isize) -> Self {
        self += offset;
        self
    }
}

impl<'a, T: 'a, A: Access, const K: usize> Sub<isize> for RandomAccessIter<'a, T, A, K> {
    type Output = Self;

    fn sub(mut self, offset: isize) -> Self {
        self -= offset;
        self
    }
}

/// `later - earlier` is the signed number of slots between the two.
impl<'a, T: 'a, const K: usize> Sub for RandomAccessIter<'a, T, ReadOnly, K> {
    type Output = isize;

    fn sub(self, origin: Self) -> isize {
        self.offset_from(&origin)
    }
}

impl<'a, T: 'a, A: Access, const K: usize> PartialEq for RandomAccessIter<'a, T, A, K> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<'a, T: 'a, A: Access, const K: usize> Eq for RandomAccessIter<'a, T, A, K> {}

impl<'a, T: 'a, A: Access, const K: usize> PartialOrd for RandomAccessIter<'a, T, A, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl<'a, T: 'a, A: Access, const K: usize> Ord for RandomAccessIter<'a, T, A, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

impl<'a, T: 'a, const K: usize> Iterator for RandomAccessIter<'a, T, ReadOnly, K> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.back {
            return None;
        }
        let deque: &'a ChunkedDeque<T, K> = self.deque;
        let item = deque.position(self.position);
        self.position += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.position);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.position = self.position.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, T: 'a, const K: usize> DoubleEndedIterator for RandomAccessIter<'a, T, ReadOnly, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back <= self.position {
            return None;
        }
        self.back -= 1;
        let deque: &'a ChunkedDeque<T, K> = self.deque;
        deque.position(self.back)
    }
}

impl<'a, T: 'a, const K: usize> ExactSizeIterator for RandomAccessIter<'a, T, ReadOnly, K> {}

impl<'a, T: 'a, const K: usize> FusedIterator for RandomAccessIter<'a, T, ReadOnly, K> {}

/// Iterator over mutable references, front to back.
pub struct IterMut<'a, T, const K: usize> {
    map: &'a ChunkMap<T, K>,
    front: usize,
    back: usize,
    _borrow: PhantomData<&'a mut T>,
}

impl<'a, T, const K: usize> IterMut<'a, T, K> {
    /// `map` must come from a deque that stays mutably borrowed for `'a`,
    /// and `front..back` must cover only live positions.
    pub(crate) fn new(map: &'a ChunkMap<T, K>, front: usize, back: usize) -> Self {
        Self {
            map,
            front,
            back,
            _borrow: PhantomData,
        }
    }

    #[allow(unsafe_code)]
    fn slot_mut(&self, position: usize) -> &'a mut T {
        let at = Cursor::from_linear::<K>(position);
        let map: &'a ChunkMap<T, K> = self.map;
        // SAFETY: the position is live and yielded once; the deque is
        // exclusively borrowed for 'a.
        unsafe { &mut *map.chunk(at.chunk).slot_ptr(at.slot) }
    }
}

impl<'a, T, const K: usize> Iterator for IterMut<'a, T, K> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.slot_mut(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T, const K: usize> DoubleEndedIterator for IterMut<'_, T, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back <= self.front {
            return None;
        }
        self.back -= 1;
        Some(self.slot_mut(self.back))
    }
}

impl<T, const K: usize> ExactSizeIterator for IterMut<'_, T, K> {}

impl<T, const K: usize> FusedIterator for IterMut<'_, T, K> {}

impl<T: fmt::Debug, const K: usize> fmt::Debug for IterMut<'_, T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}

/// Owning iterator returned by `ChunkedDeque::into_iter`.
///
/// Pops from the front (or the back, when reversed), so chunks are released
/// as the iteration drains them.
#[derive(Debug)]
pub struct IntoIter<T, const K: usize> {
    deque: ChunkedDeque<T, K>,
}

impl<T, const K: usize> IntoIter<T, K> {
    pub(crate) fn new(deque: ChunkedDeque<T, K>) -> Self {
        Self { deque }
    }
}

impl<T, const K: usize> Iterator for IntoIter<T, K> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deque.len();
        (remaining, Some(remaining))
    }
}

impl<T, const K: usize> DoubleEndedIterator for IntoIter<T, K> {
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, const K: usize> ExactSizeIterator for IntoIter<T, K> {}

impl<T, const K: usize> FusedIterator for IntoIter<T, K> {}
