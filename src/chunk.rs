use alloc::alloc::{alloc, dealloc};
use core::alloc::Layout;
use core::marker::PhantomData;
use core::ops::Range;
use core::ptr::{self, NonNull};

use crate::error::ChunkedDequeError;

/// A fixed block of `K` uninitialized slots for `T`.
///
/// The chunk never tracks which of its slots are live. Callers decide that
/// from the deque's head and tail cursors, and must destroy every live slot
/// before the chunk is dropped; dropping a chunk only releases its memory.
pub(crate) struct Chunk<T, const K: usize> {
    slots: NonNull<T>,
    _owns: PhantomData<T>,
}

// The chunk is a plain owned buffer; thread-safety follows `T`.
#[allow(unsafe_code)]
unsafe impl<T: Send, const K: usize> Send for Chunk<T, K> {}
#[allow(unsafe_code)]
unsafe impl<T: Sync, const K: usize> Sync for Chunk<T, K> {}

impl<T, const K: usize> Chunk<T, K> {
    fn layout() -> Result<Layout, ChunkedDequeError> {
        Layout::array::<T>(K).map_err(|_| ChunkedDequeError::CapacityOverflow { slots: K })
    }

    /// Allocates an empty chunk.
    ///
    /// # Errors
    ///
    /// Returns `ChunkedDequeError::CapacityOverflow` if `K` slots of `T` do not
    /// form a valid layout, and `ChunkedDequeError::AllocationFailed` if the
    /// allocator returns null.
    #[allow(unsafe_code)]
    pub(crate) fn try_new() -> Result<Self, ChunkedDequeError> {
        const { assert!(K > 0, "chunk capacity must be non-zero") };

        let layout = Self::layout()?;
        if layout.size() == 0 {
            return Ok(Self {
                slots: NonNull::dangling(),
                _owns: PhantomData,
            });
        }

        // SAFETY: the layout has a non-zero size.
        let raw = unsafe { alloc(layout) };
        let slots = NonNull::new(raw.cast::<T>())
            .ok_or(ChunkedDequeError::AllocationFailed { layout })?;
        Ok(Self {
            slots,
            _owns: PhantomData,
        })
    }

    /// Raw pointer to `slot`; valid for reads and writes of one `T`.
    #[allow(unsafe_code)]
    pub(crate) fn slot_ptr(&self, slot: usize) -> *mut T {
        assert!(slot < K, "slot {slot} out of range for chunk of {K}");
        // SAFETY: `slot < K` keeps the offset inside the allocation.
        unsafe { self.slots.as_ptr().add(slot) }
    }

    /// Moves `value` into an empty slot.
    ///
    /// # Safety
    ///
    /// `slot` must not hold a live value; a live value there would be leaked.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn construct(&mut self, slot: usize, value: T) {
        self.slot_ptr(slot).write(value);
    }

    /// Moves the value out of a live slot, leaving it uninitialized.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn take(&mut self, slot: usize) -> T {
        self.slot_ptr(slot).read()
    }

    /// # Safety
    ///
    /// `slot` must hold a live value.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn get(&self, slot: usize) -> &T {
        &*self.slot_ptr(slot)
    }

    /// # Safety
    ///
    /// `slot` must hold a live value.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn get_mut(&mut self, slot: usize) -> &mut T {
        &mut *self.slot_ptr(slot)
    }

    /// Drops the values in `slots` in ascending order.
    ///
    /// # Safety
    ///
    /// Every slot in the range must hold a live value. They are uninitialized
    /// afterwards.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn destroy(&mut self, slots: Range<usize>) {
        if slots.is_empty() {
            return;
        }
        assert!(slots.end <= K, "slot range {slots:?} out of range for chunk of {K}");
        let live = ptr::slice_from_raw_parts_mut(self.slot_ptr(slots.start), slots.len());
        ptr::drop_in_place(live);
    }
}

impl<T, const K: usize> Drop for Chunk<T, K> {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout() {
            if layout.size() != 0 {
                // SAFETY: allocated in `try_new` with this same layout.
                unsafe { dealloc(self.slots.as_ptr().cast::<u8>(), layout) };
            }
        }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use core::cell::Cell;

    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_construct_and_take() {
        let mut chunk = Chunk::<String, 4>::try_new().unwrap();
        unsafe {
            chunk.construct(0, "first".to_string());
            chunk.construct(3, "last".to_string());
            assert_eq!(chunk.get(0), "first");
            chunk.get_mut(3).push('!');
            assert_eq!(chunk.take(3), "last!");
            assert_eq!(chunk.take(0), "first");
        }
    }

    #[test]
    fn test_destroy_drops_only_the_range() {
        let drops = Rc::new(Cell::new(0));
        let mut chunk = Chunk::<Tracked, 4>::try_new().unwrap();
        unsafe {
            for slot in 0..4 {
                chunk.construct(slot, Tracked(Rc::clone(&drops)));
            }
            chunk.destroy(1..3);
            assert_eq!(drops.get(), 2);
            chunk.destroy(0..1);
            chunk.destroy(3..4);
            chunk.destroy(2..2);
        }
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn test_dropping_chunk_does_not_drop_values() {
        let drops = Rc::new(Cell::new(0));
        let mut chunk = Chunk::<Tracked, 2>::try_new().unwrap();
        let value = unsafe {
            chunk.construct(1, Tracked(Rc::clone(&drops)));
            chunk.take(1)
        };
        drop(chunk);
        assert_eq!(drops.get(), 0);
        drop(value);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_zero_sized_values() {
        let mut chunk = Chunk::<(), 8>::try_new().unwrap();
        unsafe {
            chunk.construct(7, ());
            chunk.take(7);
        }
    }

    #[test]
    fn test_layout_overflow() {
        let result = Chunk::<u64, { usize::MAX / 4 }>::try_new();
        assert!(matches!(
            result,
            Err(ChunkedDequeError::CapacityOverflow { slots }) if slots == usize::MAX / 4
        ));
    }

    #[test]
    #[should_panic(expected = "slot 4 out of range for chunk of 4")]
    fn test_slot_out_of_range() {
        let chunk = Chunk::<u8, 4>::try_new().unwrap();
        let _ = chunk.slot_ptr(4);
    }
}
