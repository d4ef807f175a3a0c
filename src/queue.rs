//! Drawing wallpapers from the candidate pool into the rotation queue.

use rand::seq::SliceRandom;
use rand::Rng;

/// Number of entries a bulk fill produces.
pub const QUEUE_LENGTH: usize = 20;

/// Draws [`QUEUE_LENGTH`] entries uniformly from `pool`, never placing the
/// same path twice in a row unless the pool holds only one distinct path.
pub fn fill<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> Vec<String> {
    let mut queue = Vec::with_capacity(QUEUE_LENGTH);
    let mut previous: Option<&String> = None;

    for _ in 0..QUEUE_LENGTH {
        let candidates: Vec<&String> = pool
            .iter()
            .filter(|path| Some(*path) != previous)
            .collect();

        let next = match candidates.choose(rng) {
            Some(path) => *path,
            // every entry equals the previous draw, or the pool is empty
            None => match pool.choose(rng) {
                Some(path) => path,
                None => break,
            },
        };
        queue.push(next.clone());
        previous = Some(next);
    }
    queue
}

/// One uniform draw from `pool`.
pub fn draw_one<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> Option<String> {
    pool.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn pool(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bulk_fill_never_repeats_adjacent_entries() {
        let pool = pool(&["a", "b", "c"]);
        for seed in 0..200 {
            let queue = fill(&pool, &mut StdRng::seed_from_u64(seed));
            assert_eq!(queue.len(), QUEUE_LENGTH);
            assert!(queue.iter().all(|p| pool.contains(p)));
            assert!(queue.windows(2).all(|w| w[0] != w[1]), "seed {seed}: {queue:?}");
        }
    }

    #[test]
    fn two_entry_pool_alternates() {
        let pool = pool(&["a", "b"]);
        let queue = fill(&pool, &mut StdRng::seed_from_u64(7));
        assert!(queue.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn duplicated_paths_still_avoid_adjacent_repeats() {
        let pool = pool(&["a", "a", "a", "b"]);
        for seed in 0..50 {
            let queue = fill(&pool, &mut StdRng::seed_from_u64(seed));
            assert_eq!(queue.len(), QUEUE_LENGTH);
            assert!(queue.windows(2).all(|w| w[0] != w[1]));
        }
    }

    #[test]
    fn single_entry_pool_repeats_without_hanging() {
        let queue = fill(&pool(&["only"]), &mut StdRng::seed_from_u64(1));
        assert_eq!(queue, vec!["only".to_string(); QUEUE_LENGTH]);

        let queue = fill(&pool(&["same", "same"]), &mut StdRng::seed_from_u64(1));
        assert_eq!(queue.len(), QUEUE_LENGTH);
    }

    #[test]
    fn empty_pool_fills_nothing() {
        assert!(fill(&[], &mut StdRng::seed_from_u64(1)).is_empty());
        assert_eq!(draw_one(&[], &mut StdRng::seed_from_u64(1)), None);
    }

    #[test]
    fn single_draw_comes_from_the_pool() {
        let pool = pool(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let drawn = draw_one(&pool, &mut rng).unwrap();
            assert!(pool.contains(&drawn));
        }
    }
}
