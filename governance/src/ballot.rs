//! Ballot sources.
//!
//! The engine only needs a complete, consistent snapshot of the ballots for
//! one poll at a time. How the snapshot is gathered (paged remote calls, a
//! bulk fetch, the local ballot box) is the source's business.

use crate::error::GovernanceError;
use crate::judicial::AnswerTally;
use crate::tally::Ballot;
use polity_store::BallotStore;
use polity_types::{ChallengeId, JudicialAnswer, ProposalId, UserId};

pub trait BallotSource {
    /// Every ballot cast on a proposal poll.
    fn proposal_ballots(&self, proposal: ProposalId) -> Result<Vec<Ballot>, GovernanceError>;

    /// Answers on a constitutionality ballot, grouped by answer.
    fn challenge_ballots(&self, challenge: ChallengeId)
        -> Result<Vec<AnswerTally>, GovernanceError>;
}

/// Reads ballots from the local ballot box.
pub struct StoredBallots<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: BallotStore + ?Sized> StoredBallots<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: BallotStore + ?Sized> BallotSource for StoredBallots<'_, S> {
    fn proposal_ballots(&self, proposal: ProposalId) -> Result<Vec<Ballot>, GovernanceError> {
        Ok(self
            .store
            .ballots_for(proposal)?
            .into_iter()
            .map(|(voter, answer)| Ballot { voter, answer })
            .collect())
    }

    fn challenge_ballots(
        &self,
        challenge: ChallengeId,
    ) -> Result<Vec<AnswerTally>, GovernanceError> {
        Ok(group_rulings(self.store.rulings_for(challenge)?))
    }
}

/// Group (judge, answer) pairs into one tally per answer.
pub fn group_rulings(rulings: Vec<(UserId, JudicialAnswer)>) -> Vec<AnswerTally> {
    let mut constitutional = Vec::new();
    let mut unconstitutional = Vec::new();
    for (judge, answer) in rulings {
        match answer {
            JudicialAnswer::Constitutional => constitutional.push(judge),
            JudicialAnswer::Unconstitutional => unconstitutional.push(judge),
        }
    }
    vec![
        AnswerTally::new(JudicialAnswer::Constitutional, constitutional),
        AnswerTally::new(JudicialAnswer::Unconstitutional, unconstitutional),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rulings_group_by_answer() {
        let grouped = group_rulings(vec![
            (UserId::new("a"), JudicialAnswer::Unconstitutional),
            (UserId::new("b"), JudicialAnswer::Constitutional),
            (UserId::new("c"), JudicialAnswer::Unconstitutional),
        ]);
        assert_eq!(grouped[0].vote_count, 1);
        assert_eq!(grouped[1].vote_count, 2);
        assert_eq!(grouped[1].voters, vec![UserId::new("a"), UserId::new("c")]);
    }
}
