/// Parallel per-level bucket histogram.
///
/// Each worker scans one contiguous chunk of the array (the last chunk
/// absorbs the remainder) into a thread-local counter array; the locals
/// are merged by reduction. No shared counters, no atomics — for the
/// thread counts this engine targets, local-then-merge removes the
/// contention an atomic-increment histogram would suffer.
use rayon::prelude::*;

use crate::record::{Keyed, NUM_BUCKETS};

/// Count how many records fall into each of the 256 buckets at `level`.
pub fn histogram<T: Keyed>(data: &[T], level: usize, num_threads: usize) -> [usize; NUM_BUCKETS] {
    debug_assert!(num_threads > 0);
    let chunk = data.len() / num_threads;

    (0..num_threads)
        .into_par_iter()
        .map(|thread| {
            let start = thread * chunk;
            let end = if thread + 1 == num_threads {
                data.len()
            } else {
                start + chunk
            };
            let mut local = [0usize; NUM_BUCKETS];
            for record in &data[start..end] {
                local[record.radix_byte(level)] += 1;
            }
            local
        })
        .reduce(
            || [0usize; NUM_BUCKETS],
            |mut acc, local| {
                for (a, l) in acc.iter_mut().zip(local.iter()) {
                    *a += l;
                }
                acc
            },
        )
}
