//! Randomness used by the manager's peer sampling and the peer's random-walk
//! search. Wrapped behind a small type so tests can swap in a fixed seed
//! instead of depending on the production default of an unpredictable seed.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// A source of randomness for DHT membership sampling and ring-walk choices.
///
/// Production code should use [`Source::from_entropy`]; tests that need
/// reproducible peer selection should use [`Source::from_seed`].
pub struct Source {
    rng: StdRng,
}

impl Source {
    /// Seed from the OS entropy source. This is the production default.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed deterministically. Intended for tests only.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose `k` distinct items from `items` uniformly at random, without
    /// replacement. Panics if `k > items.len()`, mirroring
    /// `random.sample`'s contract in the original implementation.
    pub fn sample_without_replacement<'a, T>(&mut self, items: &'a [T], k: usize) -> Vec<&'a T> {
        items.choose_multiple(&mut self.rng, k).collect()
    }

    /// Choose one item from `items` uniformly at random.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_without_replacement_is_distinct_and_sized() {
        let items: Vec<u32> = (0..10).collect();
        let mut source = Source::from_seed(42);

        let sample = source.sample_without_replacement(&items, 4);
        assert_eq!(sample.len(), 4);

        let mut seen = std::collections::HashSet::new();
        for item in &sample {
            assert!(seen.insert(**item), "sample must not repeat items");
        }
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let items: Vec<u32> = (0..20).collect();

        let mut a = Source::from_seed(7);
        let mut b = Source::from_seed(7);

        let sample_a = a.sample_without_replacement(&items, 5);
        let sample_b = b.sample_without_replacement(&items, 5);

        assert_eq!(sample_a, sample_b);
    }

    #[test]
    fn choose_returns_member_of_slice() {
        let items = vec!["apple", "goat", "tree"];
        let mut source = Source::from_seed(1);

        let chosen = source.choose(&items).expect("non-empty slice");
        assert!(items.contains(chosen));
    }
}
