// MIT License
//
// Copyright (c) 2020 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Segmented, lock-striped concurrent hash maps keyed by primitive integers.
//!
//! [`HashMap<V>`] maps `i32` keys to unboxed primitive values (`i32`, `i64`,
//! `u32` or `u64`). It is divided into a fixed number of segments, each with
//! its own lock and its own chained bucket array:
//!
//! * lookups never lock; they rely on each segment publishing its element
//!   count after every structural change,
//! * insertions, replacements and removals lock only the segment that owns
//!   the key,
//! * whole-map reads such as [`HashMap::len`] retry a few unlocked passes
//!   before locking every segment in a fixed order.
//!
//! Unlinked entries and replaced bucket arrays are reclaimed with
//! [`crossbeam-epoch`].
//!
//! ```
//! use std::{sync::Arc, thread};
//!
//! use chash::IntLongHashMap;
//!
//! let map = Arc::new(IntLongHashMap::new());
//!
//! let writers: Vec<_> = (0..4)
//!     .map(|t| {
//!         let map = map.clone();
//!
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 map.insert(t * 100 + i, i64::from(i));
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for writer in writers {
//!     writer.join().unwrap();
//! }
//!
//! assert_eq!(map.len(), 400);
//! assert_eq!(map.get(250), Some(50));
//! ```
//!
//! [`crossbeam-epoch`]: https://docs.rs/crossbeam-epoch

mod common;
mod error;
pub mod map;
mod segment;

pub use common::{Value, MAXIMUM_CAPACITY, MAX_SEGMENTS};
pub use error::{Error, Result};
pub use map::{Builder, HashMap, IntIntHashMap, IntLongHashMap};

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    #[test]
    fn hash_map_basics() {
        let map = IntLongHashMap::with_capacity(8);

        assert_eq!(map.insert(1, 5), None);
        assert_eq!(map.insert(2, 10), None);
        assert_eq!(map.insert(3, 15), None);
        assert_eq!(map.insert(4, 20), None);

        assert_eq!(map.get(1), Some(5));
        assert_eq!(map.get(2), Some(10));
        assert_eq!(map.get(3), Some(15));
        assert_eq!(map.get(4), Some(20));

        assert_eq!(map.insert(4, 5), Some(20));
        assert_eq!(map.insert(3, 10), Some(15));
        assert_eq!(map.insert(2, 15), Some(10));
        assert_eq!(map.insert(1, 20), Some(5));
    }

    #[test]
    fn hash_map_concurrent_mixed_value_types() {
        const MAX_VALUE: i32 = 512;
        const NUM_THREADS: usize = 16;

        let ints = Arc::new(IntIntHashMap::new());
        let unsigned = Arc::new(HashMap::<u64>::new());
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let ints = ints.clone();
                let unsigned = unsigned.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();

                    for j in (0..MAX_VALUE).map(|j| j + (i as i32 * MAX_VALUE)) {
                        assert_eq!(ints.insert(j, -j), None);
                        assert_eq!(unsigned.insert(j, u64::MAX - j as u64), None);
                    }
                })
            })
            .collect();

        for result in threads.into_iter().map(|t| t.join()) {
            assert!(result.is_ok());
        }

        let total = NUM_THREADS as i32 * MAX_VALUE;

        assert_eq!(ints.len(), total as usize);
        assert_eq!(unsigned.len(), total as usize);

        for i in 0..total {
            assert_eq!(ints.get(i), Some(-i));
            assert_eq!(unsigned.get(i), Some(u64::MAX - i as u64));
        }
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            IntIntHashMap::with_capacity_and_load_factor(16, 0.0).unwrap_err(),
            Error::IllegalLoadFactor(0.0)
        );
        assert_eq!(
            IntIntHashMap::with_capacity_load_factor_and_concurrency_level(16, 0.75, 0)
                .unwrap_err(),
            Error::IllegalConcurrencyLevel(0)
        );
        assert!(IntIntHashMap::with_capacity_and_load_factor(16, f32::NAN).is_err());
        assert!(IntIntHashMap::with_capacity_and_load_factor(0, 0.01).is_ok());
    }
}
