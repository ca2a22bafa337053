use std::ops::Range;

/// Range of body indices owned by worker `idx` out of `n_threads`.
///
/// The first `n_bodies % n_threads` workers get one extra body, so ranges
/// differ in length by at most one.
pub fn partition_range(n_bodies: usize, n_threads: usize, idx: usize) -> Range<usize> {
    assert!(n_threads > 0);
    debug_assert!(idx < n_threads);
    let block = n_bodies / n_threads;
    let remainder = n_bodies % n_threads;

    let start = idx * block + idx.min(remainder);
    let end = start + block + usize::from(idx < remainder);
    start..end
}

/// Split `[0, n_bodies)` into `n_threads` contiguous, disjoint ranges.
pub fn partition(n_bodies: usize, n_threads: usize) -> Vec<Range<usize>> {
    (0..n_threads)
        .map(|idx| partition_range(n_bodies, n_threads, idx))
        .collect()
}

/// Cut `data` into one mutable chunk per range. `ranges` must be
/// contiguous and start at 0, as produced by `partition`.
pub fn split_by_ranges<'a, T>(mut data: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (chunk, rest) = data.split_at_mut(range.len());
        chunks.push(chunk);
        data = rest;
    }
    chunks
}
