//! Nullable ballot source: ballots set up directly by the test.

use polity_governance::{group_rulings, AnswerTally, Ballot, BallotSource, GovernanceError};
use polity_types::{ChallengeId, JudicialAnswer, ProposalId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct NullBallots {
    proposals: Mutex<HashMap<ProposalId, Vec<Ballot>>>,
    challenges: Mutex<HashMap<ChallengeId, Vec<(UserId, JudicialAnswer)>>>,
}

impl NullBallots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote(&self, proposal: ProposalId, voter: &str, answer: &str) {
        self.proposals
            .lock()
            .unwrap()
            .entry(proposal)
            .or_default()
            .push(Ballot::new(voter, answer));
    }

    pub fn rule(&self, challenge: ChallengeId, judge: &str, answer: JudicialAnswer) {
        self.challenges
            .lock()
            .unwrap()
            .entry(challenge)
            .or_default()
            .push((UserId::new(judge), answer));
    }
}

impl BallotSource for NullBallots {
    fn proposal_ballots(&self, proposal: ProposalId) -> Result<Vec<Ballot>, GovernanceError> {
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .get(&proposal)
            .cloned()
            .unwrap_or_default())
    }

    fn challenge_ballots(
        &self,
        challenge: ChallengeId,
    ) -> Result<Vec<AnswerTally>, GovernanceError> {
        let rulings = self
            .challenges
            .lock()
            .unwrap()
            .get(&challenge)
            .cloned()
            .unwrap_or_default();
        Ok(group_rulings(rulings))
    }
}
