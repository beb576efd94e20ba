//! Nullable coin: scripted tie-break flips.

use polity_governance::CoinFlip;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns pre-configured flips in order, cycling when exhausted.
pub struct NullCoin {
    flips: Vec<bool>,
    index: AtomicUsize,
}

impl NullCoin {
    pub fn new(flips: Vec<bool>) -> Self {
        Self {
            flips,
            index: AtomicUsize::new(0),
        }
    }

    /// Always lands the same way.
    pub fn constant(value: bool) -> Self {
        Self::new(vec![value])
    }

    /// How many times the coin has been flipped.
    pub fn flips_taken(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

impl CoinFlip for NullCoin {
    fn flip(&self) -> bool {
        if self.flips.is_empty() {
            return false;
        }
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        self.flips[i % self.flips.len()]
    }
}
