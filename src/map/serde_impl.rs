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

use super::{copy_capacity, HashMap};

use crate::common::Value;

use std::{fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Serializes as a map, one segment at a time while holding that segment's
/// lock. The length is left unspecified because other segments may change
/// while earlier ones are written.
impl<V: Value + Serialize> Serialize for HashMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        for segment in self.segments.iter() {
            segment.try_for_each_locked(|key, value| map.serialize_entry(&key, &value))?;
        }

        map.end()
    }
}

/// The most entries a deserializer's length hint may preallocate for.
const MAX_PREALLOCATED_ENTRIES: usize = 4096;

struct HashMapVisitor<V> {
    marker: PhantomData<fn() -> V>,
}

impl<'de, V: Value + Deserialize<'de>> Visitor<'de> for HashMapVisitor<V> {
    type Value = HashMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map from i32 keys to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let hint = access
            .size_hint()
            .unwrap_or(0)
            .min(MAX_PREALLOCATED_ENTRIES);
        let map = HashMap::with_capacity(copy_capacity(hint));

        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }

        Ok(map)
    }
}

/// Deserializes by inserting every pair into a freshly constructed map.
impl<'de, V: Value + Deserialize<'de>> Deserialize<'de> for HashMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HashMapVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{copy_capacity, HashMap, HashMapVisitor, MAX_PREALLOCATED_ENTRIES};

    use crate::{IntIntHashMap, IntLongHashMap};

    use std::marker::PhantomData;

    use serde::de::{value, DeserializeSeed, MapAccess, Visitor};

    /// Claims `len` entries but has none to give.
    struct Unfulfilled {
        len: usize,
    }

    impl<'de> MapAccess<'de> for Unfulfilled {
        type Error = value::Error;

        fn next_key_seed<K: DeserializeSeed<'de>>(
            &mut self,
            _seed: K,
        ) -> Result<Option<K::Value>, Self::Error> {
            Ok(None)
        }

        fn next_value_seed<S: DeserializeSeed<'de>>(
            &mut self,
            _seed: S,
        ) -> Result<S::Value, Self::Error> {
            unreachable!("no key was returned")
        }

        fn size_hint(&self) -> Option<usize> {
            Some(self.len)
        }
    }

    #[test]
    fn json_round_trip() {
        let map = IntLongHashMap::new();

        for i in -50..50 {
            map.insert(i, i64::from(i) << 33);
        }

        let json = serde_json::to_string(&map).unwrap();
        let back: IntLongHashMap = serde_json::from_str(&json).unwrap();

        assert_eq!(back, map);
        assert_eq!(back.len(), 100);
    }

    #[test]
    fn deserializes_plain_json_object() {
        let map: IntIntHashMap = serde_json::from_str(r#"{"1": 10, "-2": 20}"#).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1), Some(10));
        assert_eq!(map.get(-2), Some(20));
    }

    #[test]
    fn length_hint_does_not_size_the_map() {
        let bounded = HashMap::<i64>::with_capacity(copy_capacity(MAX_PREALLOCATED_ENTRIES));

        for len in [1 << 24, usize::MAX] {
            let visitor = HashMapVisitor::<i64> {
                marker: PhantomData,
            };
            let map = visitor.visit_map(Unfulfilled { len }).unwrap();

            assert!(map.is_empty());
            assert_eq!(map.capacity(), bounded.capacity());
        }
    }

    #[test]
    fn empty_map_serializes_to_empty_object() {
        let map = IntIntHashMap::new();

        assert_eq!(serde_json::to_string(&map).unwrap(), "{}");
    }
}
