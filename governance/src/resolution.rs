//! Proposal resolution: rigging, margin and tie-break.

use crate::tally::RegionTally;
use polity_types::{RiggingMode, TieBreak};
use serde::Serialize;

/// Yae/Nay/Abstain summed over every region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub yae: u64,
    pub nay: u64,
    pub abstain: u64,
}

impl Totals {
    pub fn from_tally(tally: &RegionTally) -> Self {
        tally.regions().fold(Self::default(), |acc, (_, counts)| Self {
            yae: acc.yae + counts.yae,
            nay: acc.nay + counts.nay,
            abstain: acc.abstain + counts.abstain,
        })
    }

    /// Pad the mandated side so it strictly wins. Never removes votes.
    pub fn rigged(self, rigging: RiggingMode) -> Self {
        match rigging {
            RiggingMode::None => self,
            RiggingMode::MustPass if self.yae <= self.nay => Self {
                yae: self.nay + 1,
                ..self
            },
            RiggingMode::MustFail if self.nay <= self.yae => Self {
                nay: self.yae + 1,
                ..self
            },
            RiggingMode::MustPass | RiggingMode::MustFail => self,
        }
    }
}

/// Source of the uniform coin flip used by [`TieBreak::Coinflip`].
pub trait CoinFlip {
    fn flip(&self) -> bool;
}

/// Flips with the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadCoin;

impl CoinFlip for ThreadCoin {
    fn flip(&self) -> bool {
        rand::random::<bool>()
    }
}

/// The decision and the (rigged) totals it was made on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub passed: bool,
    pub totals: Totals,
}

/// Decide a proposal from its regional tally.
///
/// The result is terminal: the caller persists the outcome exactly once.
pub fn resolve(
    tally: &RegionTally,
    rigging: RiggingMode,
    tie_break: TieBreak,
    coin: &dyn CoinFlip,
) -> Resolution {
    let totals = Totals::from_tally(tally).rigged(rigging);
    let passed = match totals.yae.cmp(&totals.nay) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match tie_break {
            TieBreak::Coinflip => coin.flip(),
            TieBreak::Passes => true,
            TieBreak::Fails => false,
        },
    };
    Resolution { passed, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::RegionCounts;

    struct Fixed(bool);

    impl CoinFlip for Fixed {
        fn flip(&self) -> bool {
            self.0
        }
    }

    fn tally(yae: u64, nay: u64) -> RegionTally {
        let mut t = RegionTally::new();
        t.insert("capital", RegionCounts { yae, nay, abstain: 0 });
        t
    }

    #[test]
    fn must_pass_pads_yae_past_nay() {
        let r = resolve(&tally(3, 5), RiggingMode::MustPass, TieBreak::Fails, &Fixed(false));
        assert!(r.passed);
        assert!(r.totals.yae >= 6);
        assert_eq!(r.totals.nay, 5);
    }

    #[test]
    fn must_pass_pads_a_tie() {
        let r = resolve(&tally(4, 4), RiggingMode::MustPass, TieBreak::Fails, &Fixed(false));
        assert!(r.passed);
        assert_eq!(r.totals.yae, 5);
    }

    #[test]
    fn must_fail_leaves_a_losing_yae_alone() {
        let r = resolve(&tally(1, 9), RiggingMode::MustFail, TieBreak::Passes, &Fixed(true));
        assert!(!r.passed);
        assert_eq!(r.totals, Totals { yae: 1, nay: 9, abstain: 0 });
    }

    #[test]
    fn ties_follow_the_policy() {
        for _ in 0..10 {
            let r = resolve(&tally(4, 4), RiggingMode::None, TieBreak::Fails, &ThreadCoin);
            assert!(!r.passed);
        }
        assert!(resolve(&tally(4, 4), RiggingMode::None, TieBreak::Passes, &Fixed(false)).passed);
        assert!(resolve(&tally(0, 0), RiggingMode::None, TieBreak::Coinflip, &Fixed(true)).passed);
        assert!(!resolve(&tally(0, 0), RiggingMode::None, TieBreak::Coinflip, &Fixed(false)).passed);
    }

    #[test]
    fn unknown_policy_code_fails_ties() {
        let policy = TieBreak::from_code(200);
        assert!(!resolve(&tally(2, 2), RiggingMode::None, policy, &Fixed(true)).passed);
    }

    #[test]
    fn totals_sum_every_region() {
        let mut t = tally(1, 2);
        t.insert("outskirts", RegionCounts { yae: 3, nay: 0, abstain: 4 });
        assert_eq!(Totals::from_tally(&t), Totals { yae: 4, nay: 2, abstain: 4 });
    }
}
