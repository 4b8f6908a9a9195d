use std::sync::Once;

use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rbmap::{OrderedMap, OrderedSet};

static LOGGER: Once = Once::new();

/// Safe to call from every test, only the first call installs.
pub fn install_logger() {
    LOGGER.call_once(|| {
        // Another test binary harness may have set a logger already.
        let _ = pretty_env_logger::try_init();
    });
}

/// Panics with the broken invariant when the map's tree is malformed.
pub fn assert_valid_map<K: Ord, V>(map: &OrderedMap<K, V>) -> usize {
    match map.validate() {
        Ok(black_height) => {
            debug!("{} entries, black height {}", map.len(), black_height);
            black_height
        }
        Err(e) => panic!("invalid tree after {} entries: {}", map.len(), e),
    }
}

pub fn assert_valid_set<T: Ord>(set: &OrderedSet<T>) -> usize {
    match set.validate() {
        Ok(black_height) => {
            debug!("{} elements, black height {}", set.len(), black_height);
            black_height
        }
        Err(e) => panic!("invalid tree after {} elements: {}", set.len(), e),
    }
}

/// `0..count` in a random order decided by `seed`.
pub fn shuffled_keys(count: u64, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..count).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert(u64),
    Remove(u64),
}

/// A reproducible stream of inserts and removes over `0..key_space`.
pub fn random_ops(
    count: usize,
    key_space: u64,
    remove_ratio: f64,
    seed: u64,
) -> Vec<Op> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let key = rng.gen_range(0..key_space);
            if rng.gen_bool(remove_ratio) {
                Op::Remove(key)
            } else {
                Op::Insert(key)
            }
        })
        .collect()
}
