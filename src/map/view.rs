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

//! Live views over the keys, values and mappings of a [`HashMap`].
//!
//! Views borrow the map and forward every call to it, so they always reflect
//! its current contents. None of them can add mappings.

use super::{EntryIter, EntryRef, HashMap, Keys, Values};

use crate::common::Value;

use std::fmt;

/// A live view of the keys of a [`HashMap`].
///
/// Created by [`HashMap::key_set`].
#[derive(Clone, Copy)]
pub struct KeySet<'a, V: Value> {
    map: &'a HashMap<V>,
}

impl<'a, V: Value> KeySet<'a, V> {
    pub(crate) fn new(map: &'a HashMap<V>) -> Self {
        Self { map }
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if `key` is mapped.
    pub fn contains(&self, key: i32) -> bool {
        self.map.contains_key(key)
    }

    /// Removes `key` and its value from the map, returning `true` if it was
    /// mapped.
    pub fn remove(&self, key: i32) -> bool {
        self.map.remove(key).is_some()
    }

    /// Removes every mapping from the map.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Returns an iterator over the keys.
    pub fn iter(&self) -> Keys<'a, V> {
        self.map.keys()
    }
}

impl<'a, V: Value> IntoIterator for KeySet<'a, V> {
    type Item = i32;
    type IntoIter = Keys<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V: Value> fmt::Debug for KeySet<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A live view of the values of a [`HashMap`].
///
/// Created by [`HashMap::value_collection`].
#[derive(Clone, Copy)]
pub struct ValueCollection<'a, V: Value> {
    map: &'a HashMap<V>,
}

impl<'a, V: Value> ValueCollection<'a, V> {
    pub(crate) fn new(map: &'a HashMap<V>) -> Self {
        Self { map }
    }

    /// Returns the number of values, counting duplicates.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if at least one key maps to `value`.
    pub fn contains(&self, value: V) -> bool {
        self.map.contains_value(value)
    }

    /// Removes every mapping from the map.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> Values<'a, V> {
        self.map.values()
    }
}

impl<'a, V: Value> IntoIterator for ValueCollection<'a, V> {
    type Item = V;
    type IntoIter = Values<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V: Value> fmt::Debug for ValueCollection<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A live view of the mappings of a [`HashMap`].
///
/// Created by [`HashMap::entry_set`].
#[derive(Clone, Copy)]
pub struct EntrySet<'a, V: Value> {
    map: &'a HashMap<V>,
}

impl<'a, V: Value> EntrySet<'a, V> {
    pub(crate) fn new(map: &'a HashMap<V>) -> Self {
        Self { map }
    }

    /// Returns the number of mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no mappings.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if `key` is currently mapped to exactly `value`.
    pub fn contains(&self, key: i32, value: V) -> bool {
        self.map.get(key) == Some(value)
    }

    /// Removes the mapping from `key` to `value`, returning `true` if it was
    /// present.
    pub fn remove(&self, key: i32, value: V) -> bool {
        self.map.remove_if_equal(key, value)
    }

    /// Removes every mapping from the map.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Returns an iterator over the mappings.
    pub fn iter(&self) -> EntryIter<'a, V> {
        EntryIter::new(self.map)
    }
}

impl<'a, V: Value> IntoIterator for EntrySet<'a, V> {
    type Item = EntryRef<'a, V>;
    type IntoIter = EntryIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V: Value> fmt::Debug for EntrySet<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|entry| (entry.key(), entry.value())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::IntIntHashMap;

    #[test]
    fn key_set_tracks_map() {
        let map = IntIntHashMap::new();
        let keys = map.key_set();

        assert!(keys.is_empty());

        map.insert(1, 10);
        map.insert(2, 20);

        assert_eq!(keys.len(), 2);
        assert!(keys.contains(1));
        assert!(!keys.contains(3));

        assert!(keys.remove(1));
        assert!(!keys.remove(1));
        assert_eq!(map.get(1), None);

        let collected: Vec<_> = keys.into_iter().collect();
        assert_eq!(collected, vec![2]);

        keys.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn value_collection_tracks_map() {
        let map = IntIntHashMap::new();
        let values = map.value_collection();

        map.insert(1, 7);
        map.insert(2, 7);
        map.insert(3, 8);

        assert_eq!(values.len(), 3);
        assert!(values.contains(7));
        assert!(!values.contains(9));

        let mut collected: Vec<_> = values.iter().collect();
        collected.sort_unstable();
        assert_eq!(collected, vec![7, 7, 8]);

        values.clear();
        assert!(values.is_empty());
    }

    #[test]
    fn entry_set_tracks_map() {
        let map = IntIntHashMap::new();
        let entries = map.entry_set();

        map.insert(7, 1);

        assert!(entries.contains(7, 1));
        assert!(!entries.contains(7, 2));
        assert!(!entries.contains(8, 1));

        assert!(!entries.remove(7, 2));
        assert!(entries.remove(7, 1));
        assert!(entries.is_empty());

        map.insert(1, 1);
        assert_eq!(format!("{:?}", entries), "{1: 1}");
        assert_eq!(format!("{:?}", map.key_set()), "{1}");
        assert_eq!(format!("{:?}", map.value_collection()), "[1]");
    }
}
