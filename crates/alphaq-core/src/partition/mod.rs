//! Static partitioning of the candidate list across pool slots.
//!
//! Chunk `i` is served exclusively by slot `i`; there is no work stealing, so a slot whose chunk
//! drains early simply idles until the run ends.

use std::num::NonZeroUsize;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Length of every chunk but (possibly) the last: `ceil(len / width)`.
#[inline]
pub fn chunk_size(len: usize, width: NonZeroUsize) -> usize {
    len.div_ceil(width.get())
}

/// Split `items` into exactly `width` contiguous chunks, preserving order.
///
/// Trailing chunks are empty when `items` is too short to reach them.
pub fn partition<T>(items: Vec<T>, width: NonZeroUsize) -> Vec<Vec<T>> {
    let size = chunk_size(items.len(), width);
    let mut rest = items.into_iter();

    (0..width.get())
        .map(|_| rest.by_ref().take(size).collect())
        .collect()
}

/// Uniformly shuffle `items` in place.
///
/// With a seed the permutation is reproducible.
pub fn shuffle<T>(items: &mut [T], seed: Option<u64>) {
    match seed {
        Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => items.shuffle(&mut rand::thread_rng()),
    }
}
