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

//! Property tests comparing single-threaded use of [`HashMap`] against
//! `std::collections::HashMap`.

use super::HashMap;

use std::collections::HashMap as StdHashMap;

use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32, i64),
    InsertIfAbsent(i32, i64),
    Remove(i32),
    RemoveIfEqual(i32, i64),
    Replace(i32, i64),
    ReplaceIfEqual(i32, i64, i64),
    Get(i32),
    Clear,
}

// a narrow key range makes hits, collisions and removals likely
fn op() -> impl Strategy<Value = Op> {
    let key = -64..64i32;
    let value = -4..4i64;

    prop_oneof![
        8 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::InsertIfAbsent(k, v)),
        4 => key.clone().prop_map(Op::Remove),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::RemoveIfEqual(k, v)),
        2 => (key.clone(), value.clone()).prop_map(|(k, v)| Op::Replace(k, v)),
        2 => (key.clone(), value.clone(), value.clone())
            .prop_map(|(k, old, new)| Op::ReplaceIfEqual(k, old, new)),
        4 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
    ]
}

fn layout() -> impl Strategy<Value = (usize, f32, usize)> {
    (0..64usize, prop_oneof![Just(0.25f32), Just(0.75), Just(4.0)], 1..32usize)
}

proptest! {
    #[test]
    fn behaves_like_a_dictionary(
        (capacity, load_factor, concurrency_level) in layout(),
        ops in prop::collection::vec(op(), 1..400),
    ) {
        let map = HashMap::with_capacity_load_factor_and_concurrency_level(
            capacity,
            load_factor,
            concurrency_level,
        )
        .unwrap();
        let mut model = StdHashMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => prop_assert_eq!(map.insert(k, v), model.insert(k, v)),
                Op::InsertIfAbsent(k, v) => {
                    let expected = model.get(&k).copied();

                    if expected.is_none() {
                        model.insert(k, v);
                    }

                    prop_assert_eq!(map.insert_if_absent(k, v), expected);
                }
                Op::Remove(k) => prop_assert_eq!(map.remove(k), model.remove(&k)),
                Op::RemoveIfEqual(k, v) => {
                    let expected = model.get(&k) == Some(&v);

                    if expected {
                        model.remove(&k);
                    }

                    prop_assert_eq!(map.remove_if_equal(k, v), expected);
                }
                Op::Replace(k, v) => {
                    let expected = model.get_mut(&k).map(|slot| std::mem::replace(slot, v));

                    prop_assert_eq!(map.replace(k, v), expected);
                }
                Op::ReplaceIfEqual(k, old, new) => {
                    let expected = model.get(&k) == Some(&old);

                    if expected {
                        model.insert(k, new);
                    }

                    prop_assert_eq!(map.replace_if_equal(k, old, new), expected);
                }
                Op::Get(k) => prop_assert_eq!(map.get(k), model.get(&k).copied()),
                Op::Clear => {
                    map.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(map.len(), model.len());
        }

        prop_assert_eq!(map.is_empty(), model.is_empty());

        let mut contents: Vec<_> = map.iter().collect();
        contents.sort_unstable();

        let mut expected: Vec<_> = model.into_iter().collect();
        expected.sort_unstable();

        prop_assert_eq!(contents, expected);
    }

    #[test]
    fn contains_value_matches_model(
        pairs in prop::collection::vec((any::<i32>(), -16..16i64), 0..200),
        probe in -16..16i64,
    ) {
        let map: HashMap<i64> = pairs.iter().copied().collect();
        let model: StdHashMap<_, _> = pairs.into_iter().collect();

        prop_assert_eq!(map.contains_value(probe), model.values().any(|&v| v == probe));
        prop_assert_eq!(map.len(), model.len());
    }
}
