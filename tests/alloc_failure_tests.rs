use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::ptr;

use chunkdeque::{ChunkedDeque, ChunkedDequeError};

/// System allocator that can be told to fail after a number of allocations
/// on the current thread.
struct LimitedAllocator;

thread_local! {
    static REMAINING: Cell<Option<usize>> = const { Cell::new(None) };
}

#[allow(unsafe_code)]
unsafe impl GlobalAlloc for LimitedAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let allowed = REMAINING
            .try_with(|remaining| match remaining.get() {
                None => true,
                Some(0) => false,
                Some(left) => {
                    remaining.set(Some(left - 1));
                    true
                }
            })
            .unwrap_or(true);
        if allowed {
            System.alloc(layout)
        } else {
            ptr::null_mut()
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
    }
}

#[global_allocator]
static ALLOCATOR: LimitedAllocator = LimitedAllocator;

/// Runs `f` with only `allowed` allocations succeeding on this thread.
fn with_allocation_limit<R>(allowed: usize, f: impl FnOnce() -> R) -> R {
    REMAINING.with(|remaining| remaining.set(Some(allowed)));
    let result = f();
    REMAINING.with(|remaining| remaining.set(None));
    result
}

fn contents<const K: usize>(deque: &ChunkedDeque<u64, K>) -> Vec<u64> {
    deque.iter().copied().collect()
}

#[test]
fn test_failed_chunk_allocation_at_back_keeps_deque() {
    let mut deque: ChunkedDeque<u64, 4> = (0..4).collect();

    let result = with_allocation_limit(0, || deque.try_push_back(4));
    assert_eq!(
        result,
        Err(ChunkedDequeError::AllocationFailed {
            layout: Layout::array::<u64>(4).unwrap()
        })
    );

    assert_eq!(deque.len(), 4);
    assert_eq!(deque.chunk_count(), 1);
    assert_eq!(contents(&deque), [0, 1, 2, 3]);

    assert!(deque.try_push_back(4).is_ok());
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);
}

#[test]
fn test_failed_chunk_allocation_at_front_keeps_deque() {
    let mut deque: ChunkedDeque<u64, 4> = (0..4).collect();

    let result = with_allocation_limit(0, || deque.try_push_front(9));
    assert!(matches!(
        result,
        Err(ChunkedDequeError::AllocationFailed { .. })
    ));

    assert_eq!(deque.len(), 4);
    assert_eq!(deque.chunk_count(), 1);
    assert_eq!(deque.front(), Some(&0));
    assert_eq!(contents(&deque), [0, 1, 2, 3]);

    assert!(deque.try_push_front(9).is_ok());
    assert_eq!(contents(&deque), [9, 0, 1, 2, 3]);
}

#[test]
fn test_failed_first_chunk_leaves_deque_empty() {
    let mut deque: ChunkedDeque<u64, 4> = ChunkedDeque::new();

    let result = with_allocation_limit(0, || deque.try_push_front(1));
    assert!(result.is_err());
    assert!(deque.is_empty());
    assert_eq!(deque.chunk_count(), 0);
    assert_eq!(deque.pop_back(), None);
}

#[test]
fn test_failed_chunk_map_growth_at_back_keeps_deque() {
    // With one slot per chunk the fifth back push fills the initial chunk map.
    let mut deque: ChunkedDeque<u64, 1> = (0..4).collect();
    assert_eq!(deque.chunk_count(), 4);

    // The chunk itself is allocated; growing the chunk map is not.
    let result = with_allocation_limit(1, || deque.try_push_back(4));
    assert!(matches!(
        result,
        Err(ChunkedDequeError::AllocationFailed { .. })
    ));

    assert_eq!(deque.len(), 4);
    assert_eq!(deque.chunk_count(), 4);
    assert_eq!(contents(&deque), [0, 1, 2, 3]);

    deque.push_back(4);
    assert_eq!(deque.chunk_count(), 5);
    assert_eq!(contents(&deque), [0, 1, 2, 3, 4]);
}

#[test]
fn test_failed_chunk_map_growth_at_front_keeps_deque() {
    let mut deque: ChunkedDeque<u64, 1> = ChunkedDeque::new();
    for value in 0..5 {
        deque.push_front(value);
    }

    let result = with_allocation_limit(1, || deque.try_push_front(5));
    assert!(matches!(
        result,
        Err(ChunkedDequeError::AllocationFailed { .. })
    ));

    assert_eq!(deque.len(), 5);
    assert_eq!(deque.chunk_count(), 5);
    assert_eq!(contents(&deque), [4, 3, 2, 1, 0]);

    deque.push_front(5);
    assert_eq!(contents(&deque), [5, 4, 3, 2, 1, 0]);
}

#[test]
fn test_pops_succeed_when_chunk_map_cannot_shrink() {
    let mut deque: ChunkedDeque<u64, 1> = (0..100).collect();

    let (front, back) = with_allocation_limit(0, || {
        let mut front = 0;
        for _ in 0..50 {
            front += deque.pop_front().unwrap_or(u64::MAX);
        }
        let mut back = 0;
        while let Some(value) = deque.pop_back() {
            back += value;
        }
        (front, back)
    });

    assert_eq!(front, (0..50).sum::<u64>());
    assert_eq!(back, (50..100).sum::<u64>());
    assert!(deque.is_empty());
    assert_eq!(deque.chunk_count(), 0);
}
