//! Random draws used by the transaction generator
//!
//! The exchange never talks to `rand` directly; it asks a [`RandomSource`]
//! so tests can script the draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform index in `0..upper`. `upper` must be non-zero.
pub fn random_index<R: Rng + ?Sized>(rng: &mut R, upper: usize) -> usize {
    rng.gen_range(0..upper)
}

/// Transfer amount for a sender holding `balance`: `floor(r * balance / 2) + 1`
/// for `r` uniform in `[0, 1)`, computed on integers.
///
/// Always in `1..=balance / 2 + 1`, and never above `balance` when
/// `balance > 0`. `balance` must be non-zero.
pub fn random_amount<R: Rng + ?Sized>(rng: &mut R, balance: u64) -> u64 {
    rng.gen_range(0..balance) / 2 + 1
}

/// Source of the two draws the generator needs
pub trait RandomSource: Send {
    fn index(&mut self, upper: usize) -> usize;
    fn amount(&mut self, balance: u64) -> u64;
}

/// [`RandomSource`] backed by any `rand` generator
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded when a seed is configured, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn index(&mut self, upper: usize) -> usize {
        random_index(&mut self.rng, upper)
    }

    fn amount(&mut self, balance: u64) -> u64 {
        random_amount(&mut self.rng, balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_bounds_hold_for_many_balances() {
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for balance in 1..=500u64 {
                let amount = random_amount(&mut rng, balance);
                assert!(amount >= 1, "amount {amount} for balance {balance}");
                assert!(amount <= balance / 2 + 1, "amount {amount} for balance {balance}");
                assert!(amount <= balance, "amount {amount} overdraws {balance}");
            }
        }
    }

    #[test]
    fn test_amount_for_balance_of_one_is_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(random_amount(&mut rng, 1), 1);
        }
    }

    #[test]
    fn test_amount_reaches_upper_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        let max = (0..2_000).map(|_| random_amount(&mut rng, 10)).max().unwrap();
        assert_eq!(max, 5);
    }

    #[test]
    fn test_index_stays_in_range() {
        let mut source = RngSource::seeded(11);
        for upper in 1..50usize {
            assert!(source.index(upper) < upper);
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.amount(1_000), b.amount(1_000));
        }
    }
}
