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

//! Pieces shared by the segment and map layers: hash spreading, the primitive
//! value abstraction, and the capacity ceilings.

mod entry;

pub(crate) use entry::Entry;

use std::{
    fmt::Debug,
    sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering},
};

/// The maximum number of segments a map may be divided into.
///
/// Larger concurrency levels are clamped to this value.
pub const MAX_SEGMENTS: usize = 1 << 16;

/// The maximum length of a single segment's bucket array.
///
/// Once a segment's bucket array reaches this length it stops growing and
/// further insertions simply lengthen its bucket chains.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// A primitive value type that can be stored in a [`HashMap`] without boxing.
///
/// Each entry keeps its value in an atomic cell so that overwrites are visible
/// to lock-free readers as a single word-sized store. Loads use
/// [`Acquire`](Ordering::Acquire) ordering and stores use
/// [`Release`](Ordering::Release) ordering.
///
/// This trait is implemented for `i32`, `i64`, `u32` and `u64`.
///
/// [`HashMap`]: crate::HashMap
pub trait Value: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// The atomic cell that holds a value of this type inside an entry.
    type Atomic: Send + Sync;

    /// Wraps `self` in a new atomic cell.
    fn into_atomic(self) -> Self::Atomic;

    /// Reads the value currently held by `cell`.
    fn load(cell: &Self::Atomic) -> Self;

    /// Publishes `value` into `cell`.
    fn store(cell: &Self::Atomic, value: Self);
}

macro_rules! impl_value {
    ($($value:ty => $atomic:ty),* $(,)?) => {
        $(
            impl Value for $value {
                type Atomic = $atomic;

                #[inline]
                fn into_atomic(self) -> $atomic {
                    <$atomic>::new(self)
                }

                #[inline]
                fn load(cell: &$atomic) -> Self {
                    cell.load(Ordering::Acquire)
                }

                #[inline]
                fn store(cell: &$atomic, value: Self) {
                    cell.store(value, Ordering::Release);
                }
            }
        )*
    };
}

impl_value!(
    i32 => AtomicI32,
    i64 => AtomicI64,
    u32 => AtomicU32,
    u64 => AtomicU64,
);

/// Applies a supplemental hash function to a raw integer key.
///
/// Segments and buckets are both selected by masking with a power of two, so
/// keys that differ only in their upper or lower bits would otherwise collide.
/// This is a variant of the single-word Wang/Jenkins hash and is bit-for-bit
/// compatible with the hash used by the Java `CHashInt*Map` family.
#[inline]
pub(crate) fn spread(key: i32) -> u32 {
    let mut h = key as u32;

    h = h.wrapping_add((h << 15) ^ 0xffff_cd7d);
    h ^= h >> 10;
    h = h.wrapping_add(h << 3);
    h ^= h >> 6;
    h = h.wrapping_add((h << 2).wrapping_add(h << 14));

    h ^ (h >> 16)
}
