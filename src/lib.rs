#![no_std]

//! `ChunkedDeque`: a double-ended queue built from fixed-size chunks.
//!
//! Values live in chunks of `K` slots (16 by default). The deque keeps an
//! ordered array of chunk handles plus a head cursor (first live slot) and a
//! tail cursor (one past the last live slot). Values are constructed in place
//! and never move, so pushing at the front never shifts existing elements.
//!
//! # Performance Characteristics
//!
//! ## Time Complexity
//! - `push_back()`, `push_front()`: amortized O(1); a chunk is allocated
//!   only when the end chunk is full
//! - `pop_back()`, `pop_front()`: amortized O(1); a chunk is released as soon
//!   as it holds no live value
//! - `get()`, `at()`, indexing: O(1), one division and one extra indirection
//! - iterator offsets (`it + n`, `it - n`) and differences: O(1)
//!
//! ## Space Complexity
//! - At most two partially used chunks (head and tail)
//! - One handle per chunk in the chunk map, which doubles when an end runs
//!   out of room and halves once it is at most a quarter used
//!
//! ## Choosing `K`
//! Larger chunks mean fewer allocations and a smaller chunk map, at the cost
//! of more unused slots in the head and tail chunks.
//!
//! ## `no_std` Compatibility
//!
//! The crate only needs `core` and `alloc`. Enable the `std` feature to get
//! `std::error::Error` through `thiserror/std`, and the `tracing` feature to
//! emit TRACE events on chunk allocation and release.
//!
//! # Deque Interface
//!
//! ```
//! # use chunkdeque::ChunkedDeque;
//! let mut deque: ChunkedDeque<i32, 4> = ChunkedDeque::new();
//!
//! deque.push_back(2);
//! deque.push_back(3);
//! deque.push_front(1);
//!
//! assert_eq!(deque.len(), 3);
//! assert_eq!(deque[0], 1);
//! assert_eq!(deque.at(2), Ok(&3));
//! assert!(deque.at(3).is_err());
//!
//! assert_eq!(deque.pop_front(), Some(1));
//! assert_eq!(deque.pop_back(), Some(3));
//! assert_eq!(deque.pop_back(), Some(2));
//! assert_eq!(deque.pop_back(), None);
//! assert_eq!(deque.chunk_count(), 0);
//! ```
//!
//! # Random-Access Iterators
//!
//! `begin()` and `end()` return iterators that behave like positions in the
//! sequence: they can be offset, compared and subtracted.
//!
//! ```
//! # use chunkdeque::ChunkedDeque;
//! let deque: ChunkedDeque<u32, 4> = (0..10).collect();
//!
//! let begin = deque.begin();
//! let end = deque.end();
//! assert_eq!(end - begin, 10);
//!
//! let mut it = begin + 3;
//! assert_eq!(it.get(), Some(&3));
//! assert_eq!((it.chunk(), it.slot()), (0, 3));
//!
//! it.inc();
//! assert_eq!((it.chunk(), it.slot()), (1, 0));
//! assert!(it < end);
//!
//! // The read-only iterator is also a regular Rust iterator.
//! let tail: Vec<u32> = it.copied().collect();
//! assert_eq!(tail, [4, 5, 6, 7, 8, 9]);
//! ```
//!
//! Mutable access goes through `begin_mut()` or `iter_mut()`:
//!
//! ```
//! # use chunkdeque::ChunkedDeque;
//! let mut deque: ChunkedDeque<u32> = ChunkedDeque::from_elem(5, 1);
//!
//! let mut it = deque.begin_mut();
//! it += 2;
//! *it.get_mut().unwrap() = 7;
//!
//! for value in deque.iter_mut() {
//!     *value *= 10;
//! }
//! assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [10, 10, 70, 10, 10]);
//! ```

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod chunk;
mod core;
mod cursor;
mod error;
mod iter;
mod map;

// Re-export public types and traits
pub use crate::core::{ChunkedDeque, DEFAULT_CHUNK_CAPACITY};
pub use crate::error::ChunkedDequeError;
pub use crate::iter::{Access, IntoIter, Iter, IterMut, RandomAccessIter, ReadOnly, ReadWrite};
