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

use super::{threshold, Locked, Segment, Table};

use crate::common::{Entry, Value};

use std::sync::atomic::Ordering;

use crossbeam_epoch::{Guard, Owned};
use tracing::{debug, trace};

impl<V: Value> Segment<V> {
    /// Replaces this segment's table with one twice as long.
    ///
    /// Within each old chain, the trailing run of nodes that all land in the
    /// same new bucket is linked into the new table as-is; only the nodes in
    /// front of that run are cloned. The old table and its chains are never
    /// written to, so readers still holding it keep a consistent view.
    ///
    /// Growth stops once the table is `max_length` long.
    pub(super) fn rehash(&self, locked: &mut Locked, guard: &Guard) {
        let old_ptr = self.table.load(Ordering::Relaxed, guard);
        let old_table = unsafe { old_ptr.deref() };
        let old_length = old_table.len();

        if old_length >= self.max_length {
            if !locked.saturated {
                debug!(
                    length = old_length,
                    count = self.count.load(Ordering::Relaxed),
                    "segment reached maximum capacity, refusing to grow"
                );

                locked.saturated = true;
            }

            return;
        }

        let new_table = Table::with_length(old_length << 1);
        let mask = new_table.len() - 1;
        let mut retired = Vec::new();
        let mut reused = 0usize;

        for bucket in old_table.buckets.iter() {
            let head_ptr = bucket.load(Ordering::Relaxed, guard);

            let head = match unsafe { head_ptr.as_ref() } {
                Some(head) => head,
                None => continue,
            };

            let mut last_run_ptr = head_ptr;
            let mut last_run_index = head.hash as usize & mask;
            let mut entry_ptr = head.next(guard);

            while let Some(entry) = unsafe { entry_ptr.as_ref() } {
                let index = entry.hash as usize & mask;

                if index != last_run_index {
                    last_run_index = index;
                    last_run_ptr = entry_ptr;
                }

                entry_ptr = entry.next(guard);
            }

            new_table.buckets[last_run_index].store(last_run_ptr, Ordering::Relaxed);
            reused += 1;

            let mut entry_ptr = head_ptr;

            while entry_ptr != last_run_ptr {
                let entry = unsafe { entry_ptr.deref() };
                let new_bucket = &new_table.buckets[entry.hash as usize & mask];
                let new_head = new_bucket.load(Ordering::Relaxed, guard);

                new_bucket.store(
                    Entry::new(entry.key, entry.hash, entry.value(), new_head),
                    Ordering::Relaxed,
                );
                retired.push(entry_ptr);

                entry_ptr = entry.next(guard);
            }
        }

        let new_length = new_table.len();

        self.table.store(Owned::new(new_table), Ordering::Release);
        locked.threshold = threshold(new_length, self.load_factor);

        trace!(
            old_length,
            new_length,
            reused_runs = reused,
            cloned = retired.len(),
            "rehashed segment"
        );

        unsafe {
            guard.defer_destroy(old_ptr);

            for entry_ptr in retired {
                guard.defer_destroy(entry_ptr);
            }
        }
    }
}
