//! Uniform sampling without replacement.

use rand::Rng;
use rand::seq::SliceRandom;

/// Pick `n` distinct items uniformly at random from `pool`.
///
/// Uses a partial Fisher-Yates shuffle, so every `n`-subset is equally likely
/// and no item is returned twice (assuming `pool` itself has no duplicates).
/// When `n` exceeds the pool size the whole pool is returned shuffled.
pub fn sample_distinct<T, R>(mut pool: Vec<T>, n: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let take = n.min(pool.len());
    let (picked, _) = pool.partial_shuffle(rng, take);
    picked.to_vec()
}
