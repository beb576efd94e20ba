//! Nullable infrastructure for deterministic testing.
//!
//! Every outside dependency of the engines (clock, coin flip, storage,
//! ballot source) sits behind a trait. The implementations here:
//! - return deterministic values
//! - can be steered programmatically
//! - never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod ballots;
pub mod clock;
pub mod coin;
pub mod store;

pub use ballots::NullBallots;
pub use clock::NullClock;
pub use coin::NullCoin;
pub use store::NullStore;
