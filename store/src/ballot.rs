//! Ballot box storage.
//!
//! Stores answers cast outside a chat platform (for example from the command
//! line). The governance engine reads ballots through its own snapshot trait
//! and does not care whether they came from here.

use crate::StoreError;
use polity_types::{ChallengeId, JudicialAnswer, ProposalId, UserId};

pub trait BallotStore {
    /// Record `voter`'s answer on a proposal, replacing any earlier answer.
    fn cast_ballot(&self, proposal: ProposalId, voter: &UserId, answer: &str)
        -> Result<(), StoreError>;

    /// Every (voter, answer) pair for a proposal.
    fn ballots_for(&self, proposal: ProposalId) -> Result<Vec<(UserId, String)>, StoreError>;

    /// Record a judge's answer on a challenge, replacing any earlier answer.
    fn cast_ruling(
        &self,
        challenge: ChallengeId,
        judge: &UserId,
        answer: JudicialAnswer,
    ) -> Result<(), StoreError>;

    /// Every (judge, answer) pair for a challenge.
    fn rulings_for(&self, challenge: ChallengeId)
        -> Result<Vec<(UserId, JudicialAnswer)>, StoreError>;
}
