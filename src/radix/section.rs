/// Index-range bookkeeping for one radix level.
///
/// A `Section` is a half-open interval `[head, tail)` into the record
/// array. The global layout assigns one section per bucket; the planner
/// subdivides each bucket's residual section into per-thread subranges.
/// All concurrent safety in the engine rests on these ranges being
/// disjoint, so the planner asserts the tiling it produces.
use crate::record::NUM_BUCKETS;

/// Half-open index interval `[head, tail)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Section {
    pub head: usize,
    pub tail: usize,
}

impl Section {
    #[inline]
    pub fn new(head: usize, tail: usize) -> Self {
        debug_assert!(head <= tail);
        Section { head, tail }
    }

    /// Zero-length section pinned at a position. Used for threads that
    /// get no work in a bucket this iteration.
    #[inline]
    pub fn empty_at(pos: usize) -> Self {
        Section {
            head: pos,
            tail: pos,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head >= self.tail
    }
}

/// Exclusive prefix sum over the per-bucket counts: bucket `b` owns
/// `[sum(counts[..b]), sum(counts[..=b]))` of the array.
pub fn bucket_layout(counts: &[usize; NUM_BUCKETS]) -> [Section; NUM_BUCKETS] {
    let mut layout = [Section::default(); NUM_BUCKETS];
    let mut sum = 0;
    for (bucket, &count) in counts.iter().enumerate() {
        layout[bucket] = Section::new(sum, sum + count);
        sum += count;
    }
    layout
}

/// Split every bucket's residual range across `num_threads` workers for
/// one convergence iteration. Plan shape is `[thread][bucket]` so each
/// permutation task owns one row outright.
///
/// Rules per bucket (residual size `total`):
/// - `total == 0`: every thread pinned empty at `tail`.
/// - `total < num_threads`: thread 0 takes the whole range; splitting a
///   tiny range into size-1 chunks is pathological.
/// - otherwise equal chunks of `total / num_threads`, the last absorbing
///   the remainder. Threads past the ones needed are pinned at `tail`.
pub fn plan_sections(
    global: &[Section; NUM_BUCKETS],
    num_threads: usize,
) -> Vec<[Section; NUM_BUCKETS]> {
    debug_assert!(num_threads > 0);
    let mut plan = vec![[Section::default(); NUM_BUCKETS]; num_threads];

    for bucket in 0..NUM_BUCKETS {
        let g = global[bucket];
        let total = g.len();

        if total == 0 {
            for row in plan.iter_mut() {
                row[bucket] = Section::empty_at(g.tail);
            }
            continue;
        }

        let (needed, chunk) = if total < num_threads {
            (1, total)
        } else {
            (num_threads, total / num_threads)
        };

        for (thread, row) in plan.iter_mut().enumerate().take(needed) {
            let head = g.head + chunk * thread;
            row[bucket] = Section::new(head, head + chunk);
        }
        // Last active thread absorbs the division remainder
        plan[needed - 1][bucket].tail = g.tail;

        for row in plan.iter_mut().skip(needed) {
            row[bucket] = Section::empty_at(g.tail);
        }

        debug_assert!(subranges_tile(&plan, bucket, g));
    }

    plan
}

/// Check that the per-thread subranges for `bucket` exactly tile the
/// bucket's residual range with no gaps or overlaps. Any violation here
/// would turn the lock-free permutation stage into a data race.
#[cfg(debug_assertions)]
fn subranges_tile(plan: &[[Section; NUM_BUCKETS]], bucket: usize, g: Section) -> bool {
    let mut pos = g.head;
    for row in plan {
        let s = row[bucket];
        if !s.is_empty() {
            if s.head != pos || s.tail > g.tail {
                return false;
            }
            pos = s.tail;
        }
    }
    pos == g.tail
}

#[cfg(not(debug_assertions))]
#[inline]
fn subranges_tile(_plan: &[[Section; NUM_BUCKETS]], _bucket: usize, _g: Section) -> bool {
    true
}
