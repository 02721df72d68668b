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

use super::Value;

use std::sync::atomic::Ordering;

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};

/// A node in a segment's bucket chain.
///
/// The key, hash and successor of an entry never change once it is reachable
/// from a bucket array. Only the value cell is written in place; every
/// structural change builds new nodes instead, so a reader that is halfway
/// down a chain never observes a dangling or cyclic link.
pub(crate) struct Entry<V: Value> {
    pub(crate) key: i32,
    pub(crate) hash: u32,
    value: V::Atomic,
    next: Atomic<Entry<V>>,
}

impl<V: Value> Entry<V> {
    pub(crate) fn new(key: i32, hash: u32, value: V, next: Shared<'_, Self>) -> Owned<Self> {
        Owned::new(Self {
            key,
            hash,
            value: value.into_atomic(),
            next: Atomic::from(next),
        })
    }

    #[inline]
    pub(crate) fn value(&self) -> V {
        V::load(&self.value)
    }

    #[inline]
    pub(crate) fn set_value(&self, value: V) {
        V::store(&self.value, value);
    }

    #[inline]
    pub(crate) fn next<'g>(&self, guard: &'g Guard) -> Shared<'g, Self> {
        self.next.load(Ordering::Acquire, guard)
    }

    #[inline]
    pub(crate) fn matches(&self, key: i32, hash: u32) -> bool {
        self.hash == hash && self.key == key
    }

    /// Walks the chain starting at `head`, returning the entry for `key` or a
    /// null pointer.
    pub(crate) fn find<'g>(
        mut head: Shared<'g, Self>,
        key: i32,
        hash: u32,
        guard: &'g Guard,
    ) -> Shared<'g, Self> {
        while let Some(entry) = unsafe { head.as_ref() } {
            if entry.matches(key, hash) {
                break;
            }

            head = entry.next(guard);
        }

        head
    }
}
