//! Uniform variates consumed by every sampler.
//!
//! Samplers never own a generator. They borrow any [rand::Rng] for the duration of
//! a single draw, so one seeded stream can drive several samplers and a priority queue in
//! the same simulation loop.
use std::convert::Infallible;

use rand::{Rng, TryRng};

const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Generate a random float in the range [0, 1) from the top 53 bits of a 64-bit word.
#[inline]
pub fn unit_f64<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * UNIT_SCALE
}

/// Generate a raw 32-bit word.
#[inline]
pub fn discrete_u32<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.next_u32()
}

/// Deterministic source that replays a fixed list of values, cycling when exhausted.
///
/// Values are stored as 64-bit words whose upper 32 bits are what [Rng::next_u32]
/// returns, so a unit value `u` maps to `unit_f64 ≈ u` and to a 32-bit word `⌊u·2³²⌋`.
#[derive(Debug, Clone)]
pub struct ReplayRng {
    words: Vec<u64>,
    cursor: usize,
}

impl ReplayRng {
    /// Replay unit variates in [0, 1).
    ///
    /// # Panics
    /// Panics if `units` is empty or a value lies outside [0, 1).
    pub fn from_units(units: &[f64]) -> Self {
        assert!(!units.is_empty(), "ReplayRng needs at least one value");
        let words = units
            .iter()
            .map(|&u| {
                assert!((0.0..1.0).contains(&u), "unit variate {u} outside [0, 1)");
                ((u * (1u64 << 53) as f64) as u64) << 11
            })
            .collect();
        Self { words, cursor: 0 }
    }

    /// Replay raw 32-bit words.
    ///
    /// # Panics
    /// Panics if `words` is empty.
    pub fn from_words(words: &[u32]) -> Self {
        assert!(!words.is_empty(), "ReplayRng needs at least one value");
        Self {
            words: words.iter().map(|&w| (w as u64) << 32).collect(),
            cursor: 0,
        }
    }

    /// Number of values consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    fn next_word(&mut self) -> u64 {
        let word = self.words[self.cursor % self.words.len()];
        self.cursor += 1;
        word
    }
}

impl TryRng for ReplayRng {
    type Error = Infallible;

    fn try_next_u32(&mut self) -> Result<u32, Infallible> {
        Ok((self.next_word() >> 32) as u32)
    }

    fn try_next_u64(&mut self) -> Result<u64, Infallible> {
        Ok(self.next_word())
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Infallible> {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    struct FixedRng {
        value: u64,
    }

    impl TryRng for FixedRng {
        type Error = Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Infallible> {
            Ok(self.value as u32)
        }

        fn try_next_u64(&mut self) -> Result<u64, Infallible> {
            Ok(self.value)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Infallible> {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
            Ok(())
        }
    }

    #[test]
    fn unit_is_zero_for_zero_word() {
        let mut rng = FixedRng { value: 0 };
        assert_eq!(unit_f64(&mut rng), 0.0);
    }

    #[test]
    fn unit_stays_below_one_for_max_word() {
        let mut rng = FixedRng { value: u64::MAX };
        let u = unit_f64(&mut rng);
        assert!(u < 1.0);
        assert!(u > 1.0 - 1e-15);
    }

    #[test]
    fn unit_values_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10_000 {
            let u = unit_f64(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn replay_units_round_trip_closely() {
        let mut rng = ReplayRng::from_units(&[0.1, 0.35, 0.6, 0.9]);
        for expected in [0.1, 0.35, 0.6, 0.9] {
            let u = unit_f64(&mut rng);
            assert!((u - expected).abs() < 1e-15, "{u} vs {expected}");
        }
        assert_eq!(rng.consumed(), 4);
        // Cycles back to the start.
        assert!((unit_f64(&mut rng) - 0.1).abs() < 1e-15);
    }

    #[test]
    fn replay_words_feed_next_u32_verbatim() {
        let mut rng = ReplayRng::from_words(&[7, u32::MAX]);
        assert_eq!(discrete_u32(&mut rng), 7);
        assert_eq!(discrete_u32(&mut rng), u32::MAX);
        assert_eq!(discrete_u32(&mut rng), 7);
    }

    #[test]
    fn replay_unit_maps_to_scaled_word() {
        let mut rng = ReplayRng::from_units(&[0.5]);
        assert_eq!(rng.next_u32(), 1u32 << 31);
    }

    #[test]
    #[should_panic]
    fn replay_rejects_out_of_range_units() {
        let _ = ReplayRng::from_units(&[1.0]);
    }
}
