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

//! A segmented, lock-striped concurrent hash map keyed by `i32`.

mod builder;
mod iter;
#[cfg(feature = "serde")]
mod serde_impl;
mod view;

#[cfg(test)]
mod proptests;

pub use builder::{
    Builder, DEFAULT_CONCURRENCY_LEVEL, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR,
};
pub use iter::{EntryIter, EntryRef, Iter, Keys, Values};
pub use view::{EntrySet, KeySet, ValueCollection};

use crate::{
    common::{self, Value, MAXIMUM_CAPACITY, MAX_SEGMENTS},
    segment::{Locked, Segment},
    Error, Result,
};

use std::fmt;

use parking_lot::MutexGuard;
use tracing::debug;

/// The number of unlocked passes [`len`] and [`contains_value`] make before
/// falling back to locking every segment.
///
/// [`len`]: HashMap::len
/// [`contains_value`]: HashMap::contains_value
const RETRIES_BEFORE_LOCK: usize = 2;

/// A concurrent hash map from `i32` keys to primitive values, divided into
/// independently locked segments.
///
/// The most-significant bits of a spread key hash select a segment. Each
/// segment owns a chained bucket array that it grows on its own, under its own
/// lock, so writers to different segments never contend. Lookups take no lock
/// at all.
///
/// Keys and values are stored unboxed. Operations that would return "no
/// mapping" return [`None`] rather than a reserved sentinel, so every value of
/// `V` may be stored.
///
/// Whole-map reads such as [`len`], [`is_empty`] and [`contains_value`]
/// first try to observe a stable snapshot without locking; if concurrent
/// writers keep changing the map, [`len`] and [`contains_value`] lock every
/// segment in ascending order.
///
/// Iterators are weakly consistent: they never fail because of concurrent
/// modification, return every mapping that is present for their whole
/// lifetime, and may or may not return mappings inserted or removed while they
/// run.
///
/// # Examples
///
/// ```
/// use chash::IntLongHashMap;
///
/// let map = IntLongHashMap::new();
///
/// assert_eq!(map.insert(1, 10), None);
/// assert_eq!(map.insert_if_absent(1, 20), Some(10));
/// assert_eq!(map.get(1), Some(10));
/// assert!(map.replace_if_equal(1, 10, 30));
/// assert_eq!(map.remove(1), Some(30));
/// assert!(map.is_empty());
/// ```
///
/// [`len`]: #method.len
/// [`is_empty`]: #method.is_empty
/// [`contains_value`]: #method.contains_value
pub struct HashMap<V: Value> {
    segments: Box<[Segment<V>]>,
    segment_shift: u32,
    segment_mask: u32,
}

/// A concurrent map from `i32` to `i32`.
pub type IntIntHashMap = HashMap<i32>;

/// A concurrent map from `i32` to `i64`.
pub type IntLongHashMap = HashMap<i64>;

impl<V: Value> HashMap<V> {
    /// Creates an empty `HashMap` with the default initial capacity (16), load
    /// factor (0.75) and concurrency level (16).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates an empty `HashMap` that can hold `initial_capacity` elements
    /// before any segment grows, using the default load factor and concurrency
    /// level.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::build(
            initial_capacity,
            DEFAULT_LOAD_FACTOR,
            DEFAULT_CONCURRENCY_LEVEL,
        )
    }

    /// Creates an empty `HashMap` with the given initial capacity and load
    /// factor and the default concurrency level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalLoadFactor`] if `load_factor` is not positive
    /// and finite.
    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        load_factor: f32,
    ) -> Result<Self> {
        Self::with_capacity_load_factor_and_concurrency_level(
            initial_capacity,
            load_factor,
            DEFAULT_CONCURRENCY_LEVEL,
        )
    }

    /// Creates an empty `HashMap` with the given initial capacity, load factor
    /// and concurrency level.
    ///
    /// The map is divided into the smallest power of two number of segments
    /// that is at least `concurrency_level`, up to [`MAX_SEGMENTS`]. The
    /// initial capacity is spread evenly over the segments and each segment's
    /// table is rounded up to a power of two.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalLoadFactor`] if `load_factor` is not positive
    /// and finite, or [`Error::IllegalConcurrencyLevel`] if
    /// `concurrency_level` is 0. No map is created in either case.
    ///
    /// [`MAX_SEGMENTS`]: crate::MAX_SEGMENTS
    pub fn with_capacity_load_factor_and_concurrency_level(
        initial_capacity: usize,
        load_factor: f32,
        concurrency_level: usize,
    ) -> Result<Self> {
        if !(load_factor > 0.0 && load_factor.is_finite()) {
            return Err(Error::IllegalLoadFactor(load_factor));
        }

        if concurrency_level == 0 {
            return Err(Error::IllegalConcurrencyLevel(concurrency_level));
        }

        Ok(Self::build(initial_capacity, load_factor, concurrency_level))
    }

    /// Creates a `HashMap` holding the same mappings as `other`.
    ///
    /// The new map is sized to hold `other` at the default load factor. If
    /// `other` is being modified concurrently, the copy reflects some
    /// weakly-consistent traversal of it.
    pub fn from_map(other: &HashMap<V>) -> Self {
        let map = Self::with_capacity(copy_capacity(other.len()));
        map.insert_all(other);

        map
    }

    fn build(initial_capacity: usize, load_factor: f32, concurrency_level: usize) -> Self {
        let num_segments = concurrency_level.min(MAX_SEGMENTS).next_power_of_two();
        let segment_shift = 32 - num_segments.trailing_zeros();
        let segment_mask = (num_segments - 1) as u32;

        let initial_capacity = initial_capacity.min(MAXIMUM_CAPACITY);
        let segment_capacity = ((initial_capacity + num_segments - 1) / num_segments)
            .max(1)
            .next_power_of_two();

        debug!(
            num_segments,
            segment_capacity, load_factor, "creating segmented hash map"
        );

        let segments = (0..num_segments)
            .map(|_| Segment::with_capacity(segment_capacity, load_factor))
            .collect();

        Self {
            segments,
            segment_shift,
            segment_mask,
        }
    }

    /// Returns the number of segments in the map.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the index of the segment that `key` belongs to.
    pub fn segment_index(&self, key: i32) -> usize {
        self.segment_index_from_hash(common::spread(key))
    }

    /// Returns the number of buckets in the `index`-th segment's table.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than [`num_segments`].
    ///
    /// [`num_segments`]: #method.num_segments
    pub fn segment_capacity(&self, index: usize) -> usize {
        assert!(index < self.segments.len());

        self.segments[index].capacity()
    }

    /// Returns the total number of buckets across all segment tables.
    ///
    /// Other threads can grow any segment at any time by inserting.
    pub fn capacity(&self) -> usize {
        self.segments.iter().map(Segment::capacity).sum()
    }

    /// Returns the number of mappings in the map.
    ///
    /// If the map is not modified while this runs, the result is exact.
    /// Otherwise it makes a few unlocked passes over the segments looking for
    /// one during which no segment changed, and failing that locks every
    /// segment to count.
    pub fn len(&self) -> usize {
        let mut mod_counts = vec![0; self.segments.len()];

        for _ in 0..RETRIES_BEFORE_LOCK {
            let mut sum = 0;
            let mut mod_count_sum = 0usize;

            for (segment, mod_count) in self.segments.iter().zip(mod_counts.iter_mut()) {
                sum += segment.count();
                *mod_count = segment.mod_count();
                mod_count_sum = mod_count_sum.wrapping_add(*mod_count);
            }

            // no segment has ever been modified, so all counts are zero
            if mod_count_sum == 0 {
                return sum;
            }

            let mut check = 0;
            let mut unchanged = true;

            for (segment, &mod_count) in self.segments.iter().zip(mod_counts.iter()) {
                check += segment.count();

                if segment.mod_count() != mod_count {
                    unchanged = false;

                    break;
                }
            }

            if unchanged && check == sum {
                return sum;
            }
        }

        debug!(
            retries = RETRIES_BEFORE_LOCK,
            "len: map kept changing, locking all segments"
        );

        let _locked = self.lock_all();

        self.segments.iter().map(Segment::count).sum()
    }

    /// Returns `true` if the map contains no mappings.
    ///
    /// This never locks. It returns `true` only if every segment was observed
    /// empty, twice, with no structural change in between.
    pub fn is_empty(&self) -> bool {
        let mut mod_counts = Vec::with_capacity(self.segments.len());
        let mut mod_count_sum = 0usize;

        for segment in self.segments.iter() {
            if segment.count() != 0 {
                return false;
            }

            let mod_count = segment.mod_count();
            mod_counts.push(mod_count);
            mod_count_sum = mod_count_sum.wrapping_add(mod_count);
        }

        // an element may have been added to a segment we already checked and
        // removed from one we had not reached yet
        if mod_count_sum != 0 {
            for (segment, &mod_count) in self.segments.iter().zip(mod_counts.iter()) {
                if segment.count() != 0 || segment.mod_count() != mod_count {
                    return false;
                }
            }
        }

        true
    }

    /// Returns the value corresponding to `key`.
    pub fn get(&self, key: i32) -> Option<V> {
        let hash = common::spread(key);

        self.segment_for(hash).get(key, hash)
    }

    /// Returns `true` if the map contains a mapping for `key`.
    pub fn contains_key(&self, key: i32) -> bool {
        let hash = common::spread(key);

        self.segment_for(hash).contains_key(key, hash)
    }

    /// Returns `true` if one or more keys map to `value`.
    ///
    /// This traverses the entire map. Like [`len`], it retries unlocked passes
    /// while segments are changing and falls back to locking every segment.
    ///
    /// [`len`]: #method.len
    pub fn contains_value(&self, value: V) -> bool {
        let mut mod_counts = vec![0; self.segments.len()];

        for _ in 0..RETRIES_BEFORE_LOCK {
            let mut mod_count_sum = 0usize;

            for (segment, mod_count) in self.segments.iter().zip(mod_counts.iter_mut()) {
                *mod_count = segment.mod_count();
                mod_count_sum = mod_count_sum.wrapping_add(*mod_count);

                if segment.contains_value(value) {
                    return true;
                }
            }

            let clean_sweep = mod_count_sum == 0
                || self
                    .segments
                    .iter()
                    .zip(mod_counts.iter())
                    .all(|(segment, &mod_count)| segment.mod_count() == mod_count);

            if clean_sweep {
                return false;
            }
        }

        debug!(
            retries = RETRIES_BEFORE_LOCK,
            "contains_value: map kept changing, locking all segments"
        );

        let _locked = self.lock_all();

        self.segments
            .iter()
            .any(|segment| segment.contains_value(value))
    }

    /// Maps `key` to `value`, returning the value previously mapped to `key`.
    pub fn insert(&self, key: i32, value: V) -> Option<V> {
        let hash = common::spread(key);

        self.segment_for(hash).insert(key, hash, value, false)
    }

    /// Maps `key` to `value` only if `key` is not already mapped, returning the
    /// existing value if there is one.
    ///
    /// The check and the insertion happen atomically.
    pub fn insert_if_absent(&self, key: i32, value: V) -> Option<V> {
        let hash = common::spread(key);

        self.segment_for(hash).insert(key, hash, value, true)
    }

    /// Inserts every pair produced by `iter`, in order.
    pub fn insert_all<I: IntoIterator<Item = (i32, V)>>(&self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }

    /// Removes the mapping for `key`, returning its value.
    pub fn remove(&self, key: i32) -> Option<V> {
        let hash = common::spread(key);

        self.segment_for(hash).remove_if(key, hash, |_| true)
    }

    /// Removes the mapping for `key` only if it is currently mapped to
    /// `value`. Returns `true` if a mapping was removed.
    pub fn remove_if_equal(&self, key: i32, value: V) -> bool {
        let hash = common::spread(key);

        self.segment_for(hash)
            .remove_if(key, hash, |current| current == value)
            .is_some()
    }

    /// Replaces the value for `key` only if `key` is mapped, returning the
    /// previous value.
    pub fn replace(&self, key: i32, value: V) -> Option<V> {
        let hash = common::spread(key);

        self.segment_for(hash).replace_if(key, hash, value, |_| true)
    }

    /// Replaces the value for `key` with `new_value` only if it is currently
    /// mapped to `old_value`. Returns `true` if the value was replaced.
    pub fn replace_if_equal(&self, key: i32, old_value: V, new_value: V) -> bool {
        let hash = common::spread(key);

        self.segment_for(hash)
            .replace_if(key, hash, new_value, |current| current == old_value)
            .is_some()
    }

    /// Removes every mapping.
    ///
    /// Segments are cleared one at a time, so concurrent inserts into segments
    /// that were already cleared survive.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            segment.clear();
        }
    }

    /// Returns an iterator over `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> Values<'_, V> {
        Values::new(self)
    }

    /// Returns a live view of the keys in this map.
    pub fn key_set(&self) -> KeySet<'_, V> {
        KeySet::new(self)
    }

    /// Returns a live view of the values in this map.
    pub fn value_collection(&self) -> ValueCollection<'_, V> {
        ValueCollection::new(self)
    }

    /// Returns a live view of the mappings in this map.
    pub fn entry_set(&self) -> EntrySet<'_, V> {
        EntrySet::new(self)
    }

    #[inline]
    fn segment_for(&self, hash: u32) -> &Segment<V> {
        &self.segments[self.segment_index_from_hash(hash)]
    }

    #[inline]
    fn segment_index_from_hash(&self, hash: u32) -> usize {
        if self.segment_shift == 32 {
            0
        } else {
            ((hash >> self.segment_shift) & self.segment_mask) as usize
        }
    }

    /// Locks every segment in ascending index order.
    fn lock_all(&self) -> Vec<MutexGuard<'_, Locked>> {
        self.segments.iter().map(Segment::lock).collect()
    }

    pub(crate) fn segments(&self) -> &[Segment<V>] {
        &self.segments
    }
}

fn copy_capacity(len: usize) -> usize {
    ((len as f64 / f64::from(DEFAULT_LOAD_FACTOR)) as usize)
        .saturating_add(1)
        .max(DEFAULT_INITIAL_CAPACITY)
}

impl<V: Value> Default for HashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> Clone for HashMap<V> {
    fn clone(&self) -> Self {
        Self::from_map(self)
    }
}

impl<V: Value> fmt::Debug for HashMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: Value> PartialEq for HashMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<V: Value> FromIterator<(i32, V)> for HashMap<V> {
    fn from_iter<I: IntoIterator<Item = (i32, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let map = Self::with_capacity(copy_capacity(iter.size_hint().0));
        map.insert_all(iter);

        map
    }
}

impl<V: Value> Extend<(i32, V)> for HashMap<V> {
    fn extend<I: IntoIterator<Item = (i32, V)>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<'a, V: Value> Extend<(&'a i32, &'a V)> for HashMap<V> {
    fn extend<I: IntoIterator<Item = (&'a i32, &'a V)>>(&mut self, iter: I) {
        self.insert_all(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<'a, V: Value> IntoIterator for &'a HashMap<V> {
    type Item = (i32, V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
