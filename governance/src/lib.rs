//! Governance for the polity simulation.
//!
//! Ballots flow through the regional tally into the resolution engine;
//! constitutionality ballots go through the judicial quorum evaluator. The
//! [`GovernanceEngine`] drives proposals and challenges through their
//! lifecycles on top of the repository traits.

pub mod ballot;
pub mod engine;
pub mod error;
pub mod judicial;
pub mod resolution;
pub mod tally;

pub use ballot::{group_rulings, BallotSource, StoredBallots};
pub use engine::{ChallengeEvent, GovernanceEngine, ResolvedProposal, RulingEffect};
pub use error::GovernanceError;
pub use judicial::{evaluate, AnswerTally, JudicialRoster, JudicialVerdict};
pub use resolution::{resolve, CoinFlip, Resolution, ThreadCoin, Totals};
pub use tally::{tally_by_region, Ballot, Electorate, RegionCounts, RegionTally, VoterRoll};
