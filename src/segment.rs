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

//! Independently locked shards of a segmented hash map.
//!
//! A map is divided into a fixed number of segments. The most-significant bits
//! of a spread key hash select the segment; the least-significant bits select
//! a bucket within that segment's table.
//!
//! Every mutation of a segment takes that segment's lock for the duration of
//! the call. Lookups take no lock at all: they read the segment's `count`
//! with acquire ordering before touching its table, and writers publish
//! `count` last, so a reader that observes a count also observes every entry
//! that count accounts for. Entries that a writer unlinks, and tables that a
//! rehash replaces, are reclaimed through `crossbeam-epoch` once no pinned
//! reader can still reach them.

mod rehash;

use crate::common::{Entry, Value, MAXIMUM_CAPACITY};

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_epoch::{Atomic, Guard, Shared};
use parking_lot::{Mutex, MutexGuard};

/// A power-of-two length array of bucket chain heads.
pub(crate) struct Table<V: Value> {
    buckets: Box<[Atomic<Entry<V>>]>,
}

impl<V: Value> Table<V> {
    fn with_length(length: usize) -> Self {
        assert!(length.is_power_of_two());

        Self {
            buckets: (0..length).map(|_| Atomic::null()).collect(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket(&self, hash: u32) -> &Atomic<Entry<V>> {
        &self.buckets[hash as usize & (self.buckets.len() - 1)]
    }

    #[inline]
    pub(crate) fn head<'g>(&self, index: usize, guard: &'g Guard) -> Shared<'g, Entry<V>> {
        self.buckets[index].load(Ordering::Acquire, guard)
    }
}

/// State that only the holder of a segment's lock may read or write.
pub(crate) struct Locked {
    threshold: usize,
    saturated: bool,
}

pub(crate) struct Segment<V: Value> {
    table: Atomic<Table<V>>,
    count: AtomicUsize,
    mod_count: AtomicUsize,
    lock: Mutex<Locked>,
    load_factor: f32,
    max_length: usize,
}

impl<V: Value> Segment<V> {
    /// Creates a segment whose table holds `capacity` buckets, rounded up to a
    /// power of two.
    pub(crate) fn with_capacity(capacity: usize, load_factor: f32) -> Self {
        Self::with_capacity_and_max_length(capacity, load_factor, MAXIMUM_CAPACITY)
    }

    fn with_capacity_and_max_length(capacity: usize, load_factor: f32, max_length: usize) -> Self {
        let length = capacity
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(max_length)
            .min(max_length);

        Self {
            table: Atomic::new(Table::with_length(length)),
            count: AtomicUsize::new(0),
            mod_count: AtomicUsize::new(0),
            lock: Mutex::new(Locked {
                threshold: threshold(length, load_factor),
                saturated: false,
            }),
            load_factor,
            max_length,
        }
    }

    /// Returns the number of entries in this segment.
    ///
    /// This is the acquire half of the publication protocol; read it before
    /// inspecting the table.
    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Returns the number of structural changes ever made to this segment.
    #[inline]
    pub(crate) fn mod_count(&self) -> usize {
        self.mod_count.load(Ordering::Relaxed)
    }

    /// Returns the length of this segment's current table.
    pub(crate) fn capacity(&self) -> usize {
        let guard = &crossbeam_epoch::pin();

        self.table(guard).len()
    }

    #[inline]
    pub(crate) fn table<'g>(&self, guard: &'g Guard) -> &'g Table<V> {
        unsafe { self.table.load(Ordering::Acquire, guard).deref() }
    }

    /// Acquires this segment's lock, blocking until it is available.
    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, Locked> {
        self.lock.lock()
    }

    pub(crate) fn get(&self, key: i32, hash: u32) -> Option<V> {
        let guard = &crossbeam_epoch::pin();

        self.find(key, hash, guard).map(Entry::value)
    }

    pub(crate) fn contains_key(&self, key: i32, hash: u32) -> bool {
        let guard = &crossbeam_epoch::pin();

        self.find(key, hash, guard).is_some()
    }

    /// Scans every bucket for `value` without locking.
    pub(crate) fn contains_value(&self, value: V) -> bool {
        if self.count() == 0 {
            return false;
        }

        let guard = &crossbeam_epoch::pin();
        let table = self.table(guard);

        for index in 0..table.len() {
            let mut entry_ptr = table.head(index, guard);

            while let Some(entry) = unsafe { entry_ptr.as_ref() } {
                if entry.value() == value {
                    return true;
                }

                entry_ptr = entry.next(guard);
            }
        }

        false
    }

    fn find<'g>(&self, key: i32, hash: u32, guard: &'g Guard) -> Option<&'g Entry<V>> {
        // an empty segment may be in the middle of replacing its table
        if self.count() == 0 {
            return None;
        }

        let head = self.table(guard).bucket(hash).load(Ordering::Acquire, guard);

        unsafe { Entry::find(head, key, hash, guard).as_ref() }
    }

    /// Maps `key` to `value`, returning the previous value.
    ///
    /// If `only_if_absent` is set, an existing mapping is left untouched.
    pub(crate) fn insert(&self, key: i32, hash: u32, value: V, only_if_absent: bool) -> Option<V> {
        let mut locked = self.lock.lock();
        let guard = &crossbeam_epoch::pin();

        let count = self.count.load(Ordering::Relaxed);

        if count + 1 > locked.threshold {
            self.rehash(&mut locked, guard);
        }

        let bucket = self.table(guard).bucket(hash);
        let head = bucket.load(Ordering::Relaxed, guard);

        if let Some(entry) = unsafe { Entry::find(head, key, hash, guard).as_ref() } {
            let previous = entry.value();

            if !only_if_absent {
                entry.set_value(value);
            }

            return Some(previous);
        }

        bucket.store(Entry::new(key, hash, value, head), Ordering::Release);
        self.mod_count.fetch_add(1, Ordering::Relaxed);
        self.count.store(count + 1, Ordering::Release);

        None
    }

    /// Overwrites the value for `key` if `condition` accepts the current value,
    /// returning the value that was replaced.
    pub(crate) fn replace_if<F: FnOnce(V) -> bool>(
        &self,
        key: i32,
        hash: u32,
        value: V,
        condition: F,
    ) -> Option<V> {
        let _locked = self.lock.lock();
        let guard = &crossbeam_epoch::pin();

        let head = self.table(guard).bucket(hash).load(Ordering::Relaxed, guard);
        let entry = unsafe { Entry::find(head, key, hash, guard).as_ref() }?;
        let previous = entry.value();

        if !condition(previous) {
            return None;
        }

        entry.set_value(value);

        Some(previous)
    }

    /// Removes `key` if `condition` accepts its current value, returning the
    /// removed value.
    ///
    /// The nodes in front of the removed one are cloned onto its successor
    /// rather than relinked, so readers still walking the old chain are
    /// unaffected.
    pub(crate) fn remove_if<F: FnOnce(V) -> bool>(
        &self,
        key: i32,
        hash: u32,
        condition: F,
    ) -> Option<V> {
        let _locked = self.lock.lock();
        let guard = &crossbeam_epoch::pin();

        let bucket = self.table(guard).bucket(hash);
        let head = bucket.load(Ordering::Relaxed, guard);
        let target_ptr = Entry::find(head, key, hash, guard);
        let target = unsafe { target_ptr.as_ref() }?;
        let value = target.value();

        if !condition(value) {
            return None;
        }

        self.mod_count.fetch_add(1, Ordering::Relaxed);

        let mut retired = vec![target_ptr];
        let mut new_head = target.next(guard);
        let mut entry_ptr = head;

        while entry_ptr != target_ptr {
            let entry = unsafe { entry_ptr.deref() };

            new_head =
                Entry::new(entry.key, entry.hash, entry.value(), new_head).into_shared(guard);
            retired.push(entry_ptr);
            entry_ptr = entry.next(guard);
        }

        bucket.store(new_head, Ordering::Release);
        self.count
            .store(self.count.load(Ordering::Relaxed) - 1, Ordering::Release);

        for entry_ptr in retired {
            unsafe { guard.defer_destroy(entry_ptr) };
        }

        Some(value)
    }

    pub(crate) fn clear(&self) {
        if self.count() == 0 {
            return;
        }

        let _locked = self.lock.lock();
        let guard = &crossbeam_epoch::pin();
        let table = self.table(guard);

        for bucket in table.buckets.iter() {
            let mut entry_ptr = bucket.swap(Shared::null(), Ordering::Release, guard);

            while let Some(entry) = unsafe { entry_ptr.as_ref() } {
                let next_ptr = entry.next(guard);
                unsafe { guard.defer_destroy(entry_ptr) };
                entry_ptr = next_ptr;
            }
        }

        self.mod_count.fetch_add(1, Ordering::Relaxed);
        self.count.store(0, Ordering::Release);
    }

    /// Visits every entry while holding this segment's lock.
    pub(crate) fn try_for_each_locked<E, F: FnMut(i32, V) -> Result<(), E>>(
        &self,
        mut f: F,
    ) -> Result<(), E> {
        let _locked = self.lock.lock();
        let guard = &crossbeam_epoch::pin();
        let table = self.table(guard);

        for index in 0..table.len() {
            let mut entry_ptr = table.head(index, guard);

            while let Some(entry) = unsafe { entry_ptr.as_ref() } {
                f(entry.key, entry.value())?;
                entry_ptr = entry.next(guard);
            }
        }

        Ok(())
    }
}

impl<V: Value> Drop for Segment<V> {
    fn drop(&mut self) {
        let guard = unsafe { crossbeam_epoch::unprotected() };
        let table_ptr = self.table.load(Ordering::Acquire, guard);

        // every node of the current table sits in exactly one of its chains;
        // nodes retired by earlier rehashes and removals were already deferred
        if let Some(table) = unsafe { table_ptr.as_ref() } {
            for bucket in table.buckets.iter() {
                let mut entry_ptr = bucket.load(Ordering::Relaxed, guard);

                while let Some(entry) = unsafe { entry_ptr.as_ref() } {
                    let next_ptr = entry.next(guard);
                    drop(unsafe { entry_ptr.into_owned() });
                    entry_ptr = next_ptr;
                }
            }

            drop(unsafe { table_ptr.into_owned() });
        }
    }
}

fn threshold(length: usize, load_factor: f32) -> usize {
    (length as f64 * f64::from(load_factor)).floor() as usize
}
