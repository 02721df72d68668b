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

use super::HashMap;

use crate::{common::Value, Result};

/// The initial capacity used when none is given.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// The load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// The concurrency level used when none is given.
pub const DEFAULT_CONCURRENCY_LEVEL: usize = 16;

/// Configuration for a [`HashMap`].
///
/// # Examples
///
/// ```
/// use chash::{Builder, IntIntHashMap};
///
/// let map: IntIntHashMap = Builder::new()
///     .initial_capacity(1024)
///     .concurrency_level(4)
///     .build()
///     .unwrap();
///
/// assert_eq!(map.num_segments(), 4);
/// assert_eq!(map.capacity(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Builder {
    initial_capacity: usize,
    load_factor: f32,
    concurrency_level: usize,
}

impl Builder {
    /// Returns a builder with the default initial capacity (16), load factor
    /// (0.75) and concurrency level (16).
    pub fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            concurrency_level: DEFAULT_CONCURRENCY_LEVEL,
        }
    }

    /// Sets the number of elements the map holds before any segment has to
    /// grow.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the ratio of elements to buckets past which a segment doubles its
    /// table.
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the estimated number of concurrently updating threads, which
    /// determines the number of segments.
    pub fn concurrency_level(mut self, concurrency_level: usize) -> Self {
        self.concurrency_level = concurrency_level;
        self
    }

    /// Validates the configuration and creates an empty map.
    ///
    /// # Errors
    ///
    /// See [`HashMap::with_capacity_load_factor_and_concurrency_level`].
    pub fn build<V: Value>(self) -> Result<HashMap<V>> {
        HashMap::with_capacity_load_factor_and_concurrency_level(
            self.initial_capacity,
            self.load_factor,
            self.concurrency_level,
        )
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
