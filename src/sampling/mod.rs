use crate::error::{BenchError, BenchResult};
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffles `candidates` in place and returns the first `count` of them.
pub fn sample_prefix<R: Rng, T: Clone>(rng: &mut R, candidates: &mut [T], count: usize) -> Vec<T> {
    candidates.shuffle(rng);
    candidates[..count.min(candidates.len())].to_vec()
}

/// Shuffles the items and keeps at most `limit` of them.
pub fn shuffle_truncate<R: Rng, T>(rng: &mut R, mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.shuffle(rng);
    items.truncate(limit);
    items
}

/// Picks a random element of `seeds` that differs from `seed`.
pub fn other_random_seed<'a, R: Rng, T: PartialEq>(
    rng: &mut R,
    seeds: &'a [T],
    seed: &T,
) -> BenchResult<&'a T> {
    let others: Vec<&T> = seeds.iter().filter(|it| *it != seed).collect();
    if seeds.len() < 2 || others.is_empty() {
        return Err(BenchError::NotEnoughSeeds(seeds.len()));
    }
    Ok(others[rng.gen_range(0..others.len())])
}
