/// Parallel in-place radix sort over fixed-width keyed records.
///
/// One level partitions the array into 256 buckets by the key byte at
/// that level, entirely in place: a parallel histogram fixes the global
/// bucket layout, then an iterative permute/repair loop physically
/// relocates records until every bucket's residual range is empty.
/// Settled buckets recurse independently on the next key byte.
///
/// Per level: BUILD_HISTOGRAM → LAYOUT → (PLAN → PERMUTE → REPAIR)* →
/// (RECURSE | SMALL_SORT | DONE). Each stage is a fork-join parallel
/// region; the stages never overlap.
use rayon::prelude::*;

use crate::radix::histogram::histogram;
use crate::radix::permute::{SharedRecords, permute, repair};
use crate::radix::section::{Section, bucket_layout, plan_sections};
use crate::record::{KEY_SIZE, Keyed, NUM_BUCKETS};

/// Below this many records a direct comparison sort beats another
/// partitioning pass.
pub const SMALL_SORT_THRESHOLD: usize = 64;

/// Sort `records` ascending by unsigned byte-wise key comparison,
/// starting at radix digit `start_level`, on a dedicated pool of
/// `num_threads` workers.
///
/// `num_threads == 0` is coerced to 1. Slices shorter than 2 records
/// are already sorted. The slice is mutated strictly via in-place
/// swaps — no auxiliary record buffer is ever allocated.
pub fn sort<T: Keyed>(records: &mut [T], start_level: usize, num_threads: usize) {
    if records.len() < 2 {
        return;
    }
    let num_threads = num_threads.max(1);
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => pool.install(|| parallel_radix_sort(records, start_level, num_threads)),
        // Pool construction failed (thread limits) — run on the ambient pool
        Err(_) => parallel_radix_sort(records, start_level, num_threads),
    }
}

/// One radix level plus its recursive descent. Runs on whatever rayon
/// pool is current; `num_threads` only drives section planning.
pub fn parallel_radix_sort<T: Keyed>(data: &mut [T], level: usize, num_threads: usize) {
    let num_threads = num_threads.max(1);

    if data.len() < SMALL_SORT_THRESHOLD || level >= KEY_SIZE {
        // Small sub-array or key digits exhausted: direct comparison sort
        data.sort_unstable();
        return;
    }

    let counts = histogram(data, level, num_threads);
    let mut global = bucket_layout(&counts);

    {
        let shared = SharedRecords::new(data);
        loop {
            let mut plan = plan_sections(&global, num_threads);

            // Permutation: one task per thread row, disjoint by plan
            plan.par_iter_mut()
                .for_each(|row| permute(&shared, level, row));

            // Repair: one task per bucket, disjoint by global layout
            global
                .as_mut_slice()
                .par_iter_mut()
                .enumerate()
                .for_each(|(bucket, g)| repair(&shared, level, g, &plan, bucket));

            if global.iter().all(Section::is_empty) {
                break;
            }
        }
    }

    debug_assert!(buckets_settled(data, level, &counts));

    // Buckets are independent sub-problems; fan out on the same pool so
    // work stealing bounds thread usage as recursion deepens.
    if level + 1 < KEY_SIZE {
        let mut subarrays: Vec<&mut [T]> = Vec::with_capacity(NUM_BUCKETS);
        let mut rest = data;
        for &count in counts.iter() {
            let (sub, tail) = std::mem::take(&mut rest).split_at_mut(count);
            subarrays.push(sub);
            rest = tail;
        }

        subarrays
            .into_par_iter()
            .filter(|sub| sub.len() > 1)
            .for_each(|sub| parallel_radix_sort(sub, level + 1, num_threads));
    }
}

/// Post-convergence invariant: every index inside bucket `b`'s final
/// range holds a record whose key byte at `level` is `b`.
#[cfg(debug_assertions)]
fn buckets_settled<T: Keyed>(data: &[T], level: usize, counts: &[usize; NUM_BUCKETS]) -> bool {
    let mut offset = 0;
    for (bucket, &count) in counts.iter().enumerate() {
        for record in &data[offset..offset + count] {
            if record.radix_byte(level) != bucket {
                return false;
            }
        }
        offset += count;
    }
    offset == data.len()
}

#[cfg(not(debug_assertions))]
#[inline]
fn buckets_settled<T: Keyed>(_data: &[T], _level: usize, _counts: &[usize; NUM_BUCKETS]) -> bool {
    true
}
