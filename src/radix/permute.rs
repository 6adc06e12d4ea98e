/// Permutation and repair stages of the in-place partitioning engine.
///
/// Both stages mutate the record array from several rayon workers at
/// once with no locking. The planner guarantees every worker's sections
/// are disjoint from every other worker's (and repair's per-bucket
/// ranges are disjoint by construction of the global layout), so each
/// index is touched by exactly one task per stage. `SharedRecords` is
/// the narrow unsafe seam that expresses this: all accesses are bounds
/// debug-asserted, and anything outside the caller's assigned ranges is
/// a planner bug, not a tolerated condition.
use std::marker::PhantomData;

use crate::radix::section::Section;
use crate::record::{Keyed, NUM_BUCKETS};

/// Raw view of the record array shared across one fork-join stage.
pub(crate) struct SharedRecords<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: sending the view to rayon workers is sound because every
// worker confines itself to the disjoint index ranges it was planned;
// no index is reachable from two tasks within a stage.
unsafe impl<T: Send> Send for SharedRecords<'_, T> {}
unsafe impl<T: Send> Sync for SharedRecords<'_, T> {}

impl<'a, T: Keyed> SharedRecords<'a, T> {
    pub(crate) fn new(data: &'a mut [T]) -> Self {
        SharedRecords {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// Bucket value of the record at `index`, without copying the record.
    ///
    /// SAFETY: `index` must lie inside a section owned by the calling task.
    #[inline]
    pub(crate) unsafe fn bucket_at(&self, index: usize, level: usize) -> usize {
        debug_assert!(index < self.len);
        unsafe { (*self.ptr.add(index)).radix_byte(level) }
    }

    /// Swap the records at `a` and `b`.
    ///
    /// SAFETY: both indices must lie inside sections owned by the calling task.
    #[inline]
    pub(crate) unsafe fn swap(&self, a: usize, b: usize) {
        debug_assert!(a < self.len && b < self.len);
        unsafe { std::ptr::swap(self.ptr.add(a), self.ptr.add(b)) };
    }
}

/// One thread's permutation pass over its row of the section plan.
///
/// Walks each bucket's assigned subrange from its head. A record
/// already in its home bucket is settled (advance the head past it). A
/// misplaced record is swapped toward the head of this thread's
/// subrange for its actual bucket, chaining until the record under the
/// head settles. If the destination subrange runs out of room the
/// record stays under the head, unsettled, and the walk moves on to the
/// next bucket: the head must never advance past a misplaced record,
/// since everything below it counts as settled for the repair stage.
pub(crate) fn permute<T: Keyed>(
    data: &SharedRecords<'_, T>,
    level: usize,
    sections: &mut [Section; NUM_BUCKETS],
) {
    'buckets: for bucket in 0..NUM_BUCKETS {
        while sections[bucket].head < sections[bucket].tail {
            let cursor = sections[bucket].head;
            // SAFETY: cursor stays within this thread's subrange for `bucket`
            let mut k = unsafe { data.bucket_at(cursor, level) };
            while k != bucket {
                if sections[k].is_empty() {
                    // Destination full for this thread; leave the record
                    // in place for repair.
                    continue 'buckets;
                }
                let dest = sections[k].head;
                // SAFETY: dest is the head of this thread's subrange for `k`
                unsafe { data.swap(cursor, dest) };
                sections[k].head += 1;
                k = unsafe { data.bucket_at(cursor, level) };
            }
            sections[bucket].head += 1;
        }
    }
}

/// Per-bucket repair pass, run after all permutation tasks join.
///
/// Scans the bucket's thread subranges in thread order from each local
/// head. Every misplaced record found is exchanged with a matching
/// record located by walking a tail cursor backward from the bucket's
/// global tail. On return the bucket's residual shrinks to the verified
/// tail cursor, which is what drives convergence; a misplaced record
/// whose backward search exhausts without a partner stays inside the
/// residual so the next iteration can resolve it.
pub(crate) fn repair<T: Keyed>(
    data: &SharedRecords<'_, T>,
    level: usize,
    global: &mut Section,
    plan: &[[Section; NUM_BUCKETS]],
    bucket: usize,
) {
    let mut tail = global.tail;

    for row in plan {
        let sub = row[bucket];
        let mut head = sub.head;
        while head < sub.tail && head < tail {
            // SAFETY: head < tail <= global.tail, inside this bucket's range
            let misplaced = unsafe { data.bucket_at(head, level) } != bucket;
            head += 1;
            if misplaced {
                let mut paired = false;
                while head < tail {
                    tail -= 1;
                    // SAFETY: tail stays within this bucket's global range
                    if unsafe { data.bucket_at(tail, level) } == bucket {
                        unsafe { data.swap(head - 1, tail) };
                        paired = true;
                        break;
                    }
                }
                if !paired {
                    // Everything searched above head - 1 is misplaced
                    // too; it all stays in the residual.
                    global.head = head - 1;
                    return;
                }
            }
        }
    }

    global.head = tail;
}
