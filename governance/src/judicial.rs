//! Judicial quorum evaluation.
//!
//! A constitutionality ballot closes once enough judges have answered. The
//! quorum is odd wherever possible so the bench cannot deadlock, and shrinks
//! when the author of the challenged proposal is a judge who must recuse.

use crate::error::GovernanceError;
use polity_types::{JudicialAnswer, UserId};
use serde::Serialize;

/// The size of the bench.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JudicialRoster {
    raw: u32,
    adjusted: u32,
}

impl JudicialRoster {
    /// A roster of `raw` judges. An empty bench cannot rule on anything.
    pub fn new(raw: u32) -> Result<Self, GovernanceError> {
        if raw == 0 {
            return Err(GovernanceError::NoJudges);
        }
        let adjusted = if raw % 2 == 0 { raw + 1 } else { raw };
        Ok(Self { raw, adjusted })
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// The raw count bumped to the next odd number.
    pub fn adjusted(&self) -> u32 {
        self.adjusted
    }

    /// Ballots needed before a challenge may close.
    pub fn required_votes(&self, recusal: bool) -> u32 {
        if !recusal {
            return self.adjusted;
        }
        let remaining = self.raw - 1;
        if remaining > 0 && remaining % 2 == 0 {
            remaining - 1
        } else {
            remaining
        }
    }
}

/// Votes for one answer of a constitutionality ballot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerTally {
    pub answer: JudicialAnswer,
    pub vote_count: u32,
    pub voters: Vec<UserId>,
}

impl AnswerTally {
    pub fn new(answer: JudicialAnswer, voters: Vec<UserId>) -> Self {
        Self {
            answer,
            vote_count: voters.len() as u32,
            voters,
        }
    }
}

/// The evaluated state of a challenge ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct JudicialVerdict {
    pub closable: bool,
    /// Ties count as constitutional.
    pub constitutional: bool,
    pub constitutional_votes: u32,
    pub unconstitutional_votes: u32,
    /// Whether a recusal was in effect, either required up front or forced
    /// because the original proposer voted.
    pub recused: bool,
    pub required: u32,
}

impl JudicialVerdict {
    pub fn ruling(&self) -> JudicialAnswer {
        if self.constitutional {
            JudicialAnswer::Constitutional
        } else {
            JudicialAnswer::Unconstitutional
        }
    }
}

/// Evaluate a constitutionality ballot.
///
/// If `original_proposer` voted on any answer, that vote is discarded and
/// recusal is forced regardless of `recusal_required`.
pub fn evaluate(
    answers: &[AnswerTally],
    roster: &JudicialRoster,
    original_proposer: Option<&UserId>,
    recusal_required: bool,
) -> JudicialVerdict {
    let mut constitutional_votes = 0u32;
    let mut unconstitutional_votes = 0u32;
    let mut recused = recusal_required;

    for tally in answers {
        let self_vote = original_proposer.is_some_and(|p| tally.voters.contains(p));
        let mut count = tally.vote_count;
        if self_vote {
            tracing::debug!(answer = ?tally.answer, "discarding the challenged party's own vote");
            count = count.saturating_sub(1);
            recused = true;
        }
        match tally.answer {
            JudicialAnswer::Constitutional => constitutional_votes += count,
            JudicialAnswer::Unconstitutional => unconstitutional_votes += count,
        }
    }

    let required = roster.required_votes(recused);
    JudicialVerdict {
        closable: constitutional_votes + unconstitutional_votes >= required,
        constitutional: constitutional_votes >= unconstitutional_votes,
        constitutional_votes,
        unconstitutional_votes,
        recused,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judges(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    #[test]
    fn required_votes_follow_parity_rules() {
        assert_eq!(JudicialRoster::new(5).unwrap().required_votes(false), 5);
        assert_eq!(JudicialRoster::new(6).unwrap().required_votes(false), 7);
        assert_eq!(JudicialRoster::new(6).unwrap().required_votes(true), 5);
        assert_eq!(JudicialRoster::new(5).unwrap().required_votes(true), 3);
        assert_eq!(JudicialRoster::new(1).unwrap().required_votes(true), 0);
    }

    #[test]
    fn empty_bench_is_an_error() {
        assert!(matches!(JudicialRoster::new(0), Err(GovernanceError::NoJudges)));
    }

    #[test]
    fn ties_favor_constitutionality() {
        let roster = JudicialRoster::new(3).unwrap();
        let answers = vec![
            AnswerTally::new(JudicialAnswer::Constitutional, judges(&["a", "b"])),
            AnswerTally::new(JudicialAnswer::Unconstitutional, judges(&["c", "d"])),
        ];
        let verdict = evaluate(&answers, &roster, None, false);
        assert!(verdict.constitutional);
        assert!(verdict.closable);
        assert_eq!(verdict.ruling(), JudicialAnswer::Constitutional);
    }

    #[test]
    fn proposer_vote_is_discarded_and_forces_recusal() {
        let roster = JudicialRoster::new(5).unwrap();
        let proposer = UserId::new("p");
        let answers = vec![
            AnswerTally::new(JudicialAnswer::Constitutional, judges(&["p", "a"])),
            AnswerTally::new(JudicialAnswer::Unconstitutional, judges(&["b", "c"])),
        ];
        let verdict = evaluate(&answers, &roster, Some(&proposer), false);
        assert!(verdict.recused);
        assert_eq!(verdict.constitutional_votes, 1);
        assert_eq!(verdict.unconstitutional_votes, 2);
        assert_eq!(verdict.required, 3);
        assert!(verdict.closable);
        assert!(!verdict.constitutional);
    }

    #[test]
    fn not_closable_below_quorum() {
        let roster = JudicialRoster::new(5).unwrap();
        let answers = vec![AnswerTally::new(
            JudicialAnswer::Unconstitutional,
            judges(&["a", "b", "c", "d"]),
        )];
        let verdict = evaluate(&answers, &roster, None, false);
        assert!(!verdict.closable);
        assert_eq!(verdict.required, 5);
    }
}
