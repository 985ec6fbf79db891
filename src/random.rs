use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Single source of randomness for the crate.
///
/// Guessed ratings, tag picks, and record ids all draw from here, so a seeded
/// instance makes a whole crawl reproducible.
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self { Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) } }

    pub fn from_entropy() -> Self { Self { rng: Mutex::new(StdRng::from_os_rng()) } }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock only means another draw panicked; the generator state is still usable.
        let mut guard = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Uniform value in [0, 1).
    pub fn unit(&self) -> f64 { self.with_rng(|r| r.random::<f64>()) }

    /// Uniform index in [0, n). Returns 0 when `n == 0`.
    pub fn index(&self, n: usize) -> usize {
        if n == 0 { return 0; }
        self.with_rng(|r| r.random_range(0..n))
    }

    pub fn shuffled<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let mut v = items.to_vec();
        self.with_rng(|r| v.shuffle(r));
        v
    }

    /// Between `min` and `max` (inclusive) distinct items, in random order.
    pub fn choose_some<T: Clone>(&self, items: &[T], min: usize, max: usize) -> Vec<T> {
        let max = max.min(items.len());
        let min = min.min(max);
        let take = min + self.index(max - min + 1);
        let mut v = self.shuffled(items);
        v.truncate(take);
        v
    }

    pub fn base36(&self, len: usize) -> String {
        self.with_rng(|r| (0..len).map(|_| BASE36[r.random_range(0..BASE36.len())] as char).collect())
    }
}

impl Default for RandomSource {
    fn default() -> Self { Self::from_entropy() }
}
