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

use crate::{
    common::{Entry, Value},
    segment::{Segment, Table},
    Error, Result,
};

use std::{fmt, iter::FusedIterator, ptr};

use crossbeam_epoch::Guard;

/// Weakly-consistent traversal of every segment of a map.
///
/// Segments are visited from last to first, each segment's table from its last
/// bucket to its first, and each chain from head to tail. The traversal keeps
/// the current thread pinned for as long as it lives, so the table and chain
/// it is walking cannot be reclaimed underneath it.
struct Traversal<'a, V: Value> {
    segments: &'a [Segment<V>],
    segments_left: usize,
    table: *const Table<V>,
    buckets_left: usize,
    next_entry: *const Entry<V>,
    guard: Guard,
}

impl<'a, V: Value> Traversal<'a, V> {
    fn new(segments: &'a [Segment<V>]) -> Self {
        let mut traversal = Self {
            segments,
            segments_left: segments.len(),
            table: ptr::null(),
            buckets_left: 0,
            next_entry: ptr::null(),
            guard: crossbeam_epoch::pin(),
        };

        traversal.advance();

        traversal
    }

    fn advance(&mut self) {
        if let Some(entry) = unsafe { self.next_entry.as_ref() } {
            self.next_entry = entry.next(&self.guard).as_raw();

            if !self.next_entry.is_null() {
                return;
            }
        }

        loop {
            while self.buckets_left > 0 {
                self.buckets_left -= 1;

                let table = unsafe { &*self.table };
                self.next_entry = table.head(self.buckets_left, &self.guard).as_raw();

                if !self.next_entry.is_null() {
                    return;
                }
            }

            if self.segments_left == 0 {
                return;
            }

            self.segments_left -= 1;
            let segment = &self.segments[self.segments_left];

            if segment.count() != 0 {
                let table = segment.table(&self.guard);

                self.table = table;
                self.buckets_left = table.len();
            }
        }
    }

    fn next_pair(&mut self) -> Option<(i32, V)> {
        let entry = unsafe { self.next_entry.as_ref() }?;
        let pair = (entry.key, entry.value());

        self.advance();

        Some(pair)
    }
}

/// The iteration state shared by every iterator type: the traversal plus
/// enough bookkeeping to support [`remove`](Iter::remove).
struct Cursor<'a, V: Value> {
    map: &'a HashMap<V>,
    traversal: Traversal<'a, V>,
    last_key: Option<i32>,
}

impl<'a, V: Value> Cursor<'a, V> {
    fn new(map: &'a HashMap<V>) -> Self {
        Self {
            map,
            traversal: Traversal::new(map.segments()),
            last_key: None,
        }
    }

    fn next(&mut self) -> Option<(i32, V)> {
        let pair = self.traversal.next_pair();
        self.last_key = pair.map(|(key, _)| key);

        pair
    }

    fn remove(&mut self) -> Result<Option<V>> {
        let key = self.last_key.take().ok_or(Error::NoCurrentEntry)?;

        Ok(self.map.remove(key))
    }
}

macro_rules! cursor_iterator {
    ($(#[$attr:meta])* $name:ident, $item:ty, |$map:ident, $pair:ident| $project:expr) => {
        $(#[$attr])*
        pub struct $name<'a, V: Value> {
            cursor: Cursor<'a, V>,
        }

        impl<'a, V: Value> $name<'a, V> {
            pub(crate) fn new(map: &'a HashMap<V>) -> Self {
                Self {
                    cursor: Cursor::new(map),
                }
            }

            /// Removes the mapping for the key most recently returned by this
            /// iterator from the underlying map, returning its value if it was
            /// still present.
            ///
            /// The key is looked up again rather than unlinked in place, so
            /// this is equivalent to calling [`HashMap::remove`] with it.
            ///
            /// # Errors
            ///
            /// Returns [`Error::NoCurrentEntry`] if the iterator has not yet
            /// returned an item, or if `remove` was already called since the
            /// last one.
            pub fn remove(&mut self) -> Result<Option<V>> {
                self.cursor.remove()
            }
        }

        impl<'a, V: Value> Iterator for $name<'a, V> {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                let $map = self.cursor.map;

                self.cursor.next().map(|$pair| $project)
            }
        }

        impl<'a, V: Value> FusedIterator for $name<'a, V> {}

        impl<'a, V: Value> fmt::Debug for $name<'a, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("last_key", &self.cursor.last_key)
                    .finish_non_exhaustive()
            }
        }
    };
}

cursor_iterator!(
    /// An iterator over the `(key, value)` pairs of a [`HashMap`].
    ///
    /// Created by [`HashMap::iter`]. Each value is read at the moment its
    /// entry is reached.
    Iter,
    (i32, V),
    |_map, pair| pair
);

cursor_iterator!(
    /// An iterator over the keys of a [`HashMap`].
    ///
    /// Created by [`HashMap::keys`] and [`KeySet::iter`].
    ///
    /// [`KeySet::iter`]: super::KeySet::iter
    Keys,
    i32,
    |_map, pair| pair.0
);

cursor_iterator!(
    /// An iterator over the values of a [`HashMap`].
    ///
    /// Created by [`HashMap::values`] and [`ValueCollection::iter`].
    ///
    /// [`ValueCollection::iter`]: super::ValueCollection::iter
    Values,
    V,
    |_map, pair| pair.1
);

cursor_iterator!(
    /// An iterator over the mappings of a [`HashMap`] as [`EntryRef`]s.
    ///
    /// Created by [`EntrySet::iter`].
    ///
    /// [`EntrySet::iter`]: super::EntrySet::iter
    EntryIter,
    EntryRef<'a, V>,
    |map, pair| EntryRef {
        map,
        key: pair.0,
        value: pair.1,
    }
);

/// A mapping returned by [`EntryIter`].
///
/// The value is a snapshot taken when the iterator reached the mapping.
/// [`set_value`] writes through to the map.
///
/// [`set_value`]: #method.set_value
#[derive(Clone, Copy)]
pub struct EntryRef<'a, V: Value> {
    map: &'a HashMap<V>,
    key: i32,
    value: V,
}

impl<'a, V: Value> EntryRef<'a, V> {
    /// Returns the key of this mapping.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// Returns the value observed for this mapping.
    pub fn value(&self) -> V {
        self.value
    }

    /// Maps this entry's key to `value` in the underlying map, returning the
    /// value it replaced.
    ///
    /// If the mapping was removed concurrently, this inserts it again.
    pub fn set_value(&mut self, value: V) -> Option<V> {
        self.value = value;

        self.map.insert(self.key, value)
    }
}

impl<'a, V: Value> fmt::Debug for EntryRef<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryRef")
            .field(&self.key)
            .field(&self.value)
            .finish()
    }
}

impl<'a, V: Value> PartialEq for EntryRef<'a, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}
